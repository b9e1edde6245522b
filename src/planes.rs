// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners, and the Grid, which is that mapping worked out once for
//! every pixel of the image.
use crate::config::Config;
use itertools::iproduct;
use num::Complex;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the lower-left corner and upper-right corner of the
/// Complex plane, treating the real part of each value as the
/// x-component and the imaginary part of each value as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

/// Describes the column, row of a pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of an integral plane onto points of a complex plane.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The far corner of the integral cartesian plane.  The near
    /// corner is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The two coordinates defining the complex cartesian plane,
    /// left-lower and right-upper
    pub complex_plane: ComplexPlane,
}

impl PlaneMapper {
    /// The square [-2, 2) x [-2, 2) the Newton fractal is drawn on,
    /// sampled `size` times along each axis.
    pub fn newton_square(size: usize) -> PlaneMapper {
        PlaneMapper {
            integral_plane: IntegralPlane(size, size),
            complex_plane: ComplexPlane(Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)),
        }
    }

    /// Given a pixel on the integral cartesian plane, map it to a point
    /// on the complex cartesian plane.  Pixel 0 lands exactly on the
    /// lower edge; the last pixel lands one step short of the upper
    /// edge.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let ComplexPlane(leftlower, rightupper) = self.complex_plane;
        Complex::new(
            (pixel.0 as f64) / (self.integral_plane.0 as f64) * (rightupper.re - leftlower.re)
                + leftlower.re,
            (pixel.1 as f64) / (self.integral_plane.1 as f64) * (rightupper.im - leftlower.im)
                + leftlower.im,
        )
    }
}

/// Every pixel's starting point, worked out once before the render
/// threads start and only read afterwards.  Row-major.
#[derive(Debug)]
pub struct Grid {
    size: usize,
    points: Vec<Complex<f64>>,
}

impl Grid {
    /// Builds the grid for the square image described by `config`.
    pub fn new(config: &Config) -> Grid {
        Grid::from_plane(&PlaneMapper::newton_square(config.size()))
    }

    /// Builds a grid over an arbitrary square plane.
    pub fn from_plane(plane: &PlaneMapper) -> Grid {
        let IntegralPlane(width, height) = plane.integral_plane;
        debug_assert_eq!(width, height);
        let points = iproduct!(0..height, 0..width)
            .map(|(row, column)| plane.pixel_to_point(&Pixel(column, row)))
            .collect();
        Grid {
            size: width,
            points,
        }
    }

    /// Pixels along one edge.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The starting points of row `row`, left to right.
    pub fn row(&self, row: usize) -> &[Complex<f64>] {
        &self.points[row * self.size..(row + 1) * self.size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_to_points_on_the_newton_square() {
        let pm = PlaneMapper::newton_square(4);
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 1)), Complex::new(1.0, -1.0));
    }

    #[test]
    fn pixel_to_point_scales_with_the_resolution() {
        let pm = PlaneMapper::newton_square(8);
        assert_eq!(pm.pixel_to_point(&Pixel(1, 0)), Complex::new(-1.5, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 6)), Complex::new(0.0, 1.0));
    }

    #[test]
    fn grid_is_row_major_with_columns_on_the_real_axis() {
        let grid = Grid::from_plane(&PlaneMapper::newton_square(4));
        assert_eq!(grid.size(), 4);
        assert_eq!(
            grid.row(0),
            &[
                Complex::new(-2.0, -2.0),
                Complex::new(-1.0, -2.0),
                Complex::new(0.0, -2.0),
                Complex::new(1.0, -2.0),
            ]
        );
        assert_eq!(grid.row(3)[0], Complex::new(-2.0, 1.0));
    }

    #[test]
    fn single_pixel_grid_sits_on_the_corner() {
        let grid = Grid::from_plane(&PlaneMapper::newton_square(1));
        assert_eq!(grid.row(0), &[Complex::new(-2.0, -2.0)]);
    }

    #[test]
    fn grid_never_reaches_the_upper_edge() {
        let grid = Grid::from_plane(&PlaneMapper::newton_square(7));
        for row in 0..7 {
            for point in grid.row(row) {
                assert!(point.re >= -2.0 && point.re < 2.0);
                assert!(point.im >= -2.0 && point.im < 2.0);
            }
        }
    }
}
