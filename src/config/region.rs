// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The frame regions triggers are sampled from. Coordinates are percentages of the frame
//! so that configurations work with any resolution; the sampler scales them.

use serde::{Deserialize, Serialize};

/// A rectangle in percent of the frame.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The region of the frame a trigger samples.
#[derive(Clone, Debug, PartialEq)]
pub enum Region {
    Rectangle(Position),
    /// A closed polygon of (x, y) points.
    Polygon(Vec<[f64; 2]>),
}

impl Region {
    /// Checks that the region lies within the frame and is not degenerate.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Region::Rectangle(position) => {
                for (field, value) in [
                    ("x", position.x),
                    ("y", position.y),
                    ("width", position.width),
                    ("height", position.height),
                ] {
                    if !is_percent(value) {
                        return Err(format!("{} {} is not between 0 and 100", field, value));
                    }
                }
                if position.width == 0.0 || position.height == 0.0 {
                    return Err("rectangle has no area".to_string());
                }
                if position.x + position.width > 100.0 || position.y + position.height > 100.0 {
                    return Err("rectangle extends past the frame".to_string());
                }
                Ok(())
            }
            Region::Polygon(points) => {
                if points.len() < 3 {
                    return Err(format!(
                        "shape needs at least 3 points, found {}",
                        points.len()
                    ));
                }
                match points
                    .iter()
                    .find(|[x, y]| !is_percent(*x) || !is_percent(*y))
                {
                    Some([x, y]) => Err(format!("point ({}, {}) is outside the frame", x, y)),
                    None => Ok(()),
                }
            }
        }
    }

    /// Converts the region into pixel coordinates for a frame of the given size.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> Vec<(u32, u32)> {
        let scale = |x: f64, y: f64| {
            (
                (f64::from(frame_width) * x / 100.0) as u32,
                (f64::from(frame_height) * y / 100.0) as u32,
            )
        };

        match self {
            Region::Rectangle(position) => {
                let (left, top) = scale(position.x, position.y);
                let (right, bottom) =
                    scale(position.x + position.width, position.y + position.height);
                vec![(left, top), (right, top), (right, bottom), (left, bottom)]
            }
            Region::Polygon(points) => points.iter().map(|[x, y]| scale(*x, *y)).collect(),
        }
    }
}

fn is_percent(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Region {
        Region::Rectangle(Position {
            x,
            y,
            width,
            height,
        })
    }

    #[test]
    fn test_rectangle_validation() {
        assert!(rectangle(25.0, 25.0, 20.0, 20.0).validate().is_ok());
        assert!(rectangle(0.0, 0.0, 100.0, 100.0).validate().is_ok());
        assert!(rectangle(-1.0, 0.0, 10.0, 10.0).validate().is_err());
        assert!(rectangle(0.0, 0.0, 0.0, 10.0).validate().is_err());
        assert!(rectangle(95.0, 0.0, 10.0, 10.0).validate().is_err());
        assert!(rectangle(f64::NAN, 0.0, 10.0, 10.0).validate().is_err());
    }

    #[test]
    fn test_polygon_validation() {
        assert!(Region::Polygon(vec![[10.5, 20.3], [30.2, 40.1], [50.0, 50.0]])
            .validate()
            .is_ok());
        assert!(Region::Polygon(vec![[10.5, 20.3], [30.2, 40.1]])
            .validate()
            .is_err());
        assert!(Region::Polygon(vec![[10.0, 20.0], [30.0, 140.0], [50.0, 50.0]])
            .validate()
            .is_err());
    }

    #[test]
    fn test_to_pixels() {
        assert_eq!(
            rectangle(25.0, 25.0, 20.0, 20.0).to_pixels(640, 480),
            vec![(160, 120), (288, 120), (288, 216), (160, 216)]
        );
        assert_eq!(
            Region::Polygon(vec![[0.0, 0.0], [50.0, 0.0], [50.0, 50.0]]).to_pixels(200, 100),
            vec![(0, 0), (100, 0), (100, 50)]
        );
    }
}
