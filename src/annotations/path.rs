//! Smoothed path construction from raw stroke samples.
//!
//! Interior samples become quadratic control points and each segment ends at
//! the midpoint to the next sample. The curve starts at the first sample and
//! ends exactly at the last one.

use std::fmt;

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
    LineTo(Vec2),
}

impl PathCommand {
    pub fn end_point(&self) -> Vec2 {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
            PathCommand::QuadTo { to, .. } => to,
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::MoveTo(p) => write!(f, "M{},{}", p.x, p.y),
            PathCommand::QuadTo { ctrl, to } => {
                write!(f, "Q{},{} {},{}", ctrl.x, ctrl.y, to.x, to.y)
            }
            PathCommand::LineTo(p) => write!(f, "L{},{}", p.x, p.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokePath {
    commands: Vec<PathCommand>,
}

impl StrokePath {
    pub fn from_points(points: &[Vec2]) -> Self {
        let commands = match points {
            [] => Vec::new(),
            [only] => vec![PathCommand::MoveTo(*only), PathCommand::LineTo(*only)],
            [first, .., last] => {
                let mut commands = Vec::with_capacity(points.len() + 1);
                commands.push(PathCommand::MoveTo(*first));
                for pair in points[1..].windows(2) {
                    commands.push(PathCommand::QuadTo {
                        ctrl: pair[0],
                        to: (pair[0] + pair[1]) * 0.5,
                    });
                }
                commands.push(PathCommand::LineTo(*last));
                commands
            }
        };
        Self { commands }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn start(&self) -> Option<Vec2> {
        self.commands.first().map(PathCommand::end_point)
    }

    pub fn end(&self) -> Option<Vec2> {
        self.commands.last().map(PathCommand::end_point)
    }

    /// True when every command sits on the starting point (a tap).
    pub fn is_degenerate(&self) -> bool {
        let Some(start) = self.start() else {
            return false;
        };
        self.commands.iter().all(|cmd| match *cmd {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p == start,
            PathCommand::QuadTo { ctrl, to } => ctrl == start && to == start,
        })
    }

    /// SVG path data, e.g. `M1,2 Q3,4 5,6 L7,8`.
    pub fn to_svg_data(&self) -> String {
        self.commands
            .iter()
            .map(PathCommand::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn build_path(points: &[Vec2]) -> StrokePath {
    StrokePath::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_points_give_empty_path() {
        let path = build_path(&[]);
        assert!(path.is_empty());
        assert_eq!(path.to_svg_data(), "");
        assert_eq!(path.start(), None);
    }

    #[test]
    fn test_single_point_is_zero_length() {
        let p = Vec2::new(4.0, 9.0);
        let path = build_path(&[p]);
        assert_eq!(
            path.commands(),
            &[PathCommand::MoveTo(p), PathCommand::LineTo(p)]
        );
        assert!(path.is_degenerate());
        assert_eq!(path.to_svg_data(), "M4,9 L4,9");
        assert_eq!(path.commands[0].to_string(), "M4,9");
    }

    #[test]
    fn test_two_points_are_a_straight_segment() {
        let a = Vec2::new(25.0, 50.0);
        let b = Vec2::new(35.0, 70.0);
        let path = build_path(&[a, b]);
        assert_eq!(path.commands(), &[PathCommand::MoveTo(a), PathCommand::LineTo(b)]);
        assert!(!path.is_degenerate());
    }

    #[test]
    fn test_interior_points_become_controls_with_midpoint_ends() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(20.0, 10.0),
        ];
        let path = build_path(&points);
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(points[0]),
                PathCommand::QuadTo {
                    ctrl: points[1],
                    to: Vec2::new(10.0, 5.0)
                },
                PathCommand::QuadTo {
                    ctrl: points[2],
                    to: Vec2::new(15.0, 10.0)
                },
                PathCommand::LineTo(points[3]),
            ]
        );
        assert_eq!(path.to_svg_data(), "M0,0 Q10,0 10,5 Q10,10 15,10 L20,10");
    }

    #[test]
    fn test_endpoints_match_first_and_last_points() {
        let samples: Vec<Vec2> = (0..12)
            .map(|i| Vec2::new(i as f32 * 3.5, (i as f32).sin() * 20.0))
            .collect();
        for len in 1..samples.len() {
            let path = build_path(&samples[..len]);
            assert_eq!(path.start(), Some(samples[0]));
            assert_eq!(path.end(), Some(samples[len - 1]));
        }
    }

    #[test]
    fn test_same_points_same_path() {
        let points = [Vec2::new(1.0, 1.0), Vec2::new(2.0, 3.0), Vec2::new(5.0, 8.0)];
        assert_eq!(build_path(&points), build_path(&points));
    }
}
