use stratboard_shared::Point;

pub const MIN_RENDER_POINTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    QuadTo { control: Point, end: Point },
    LineTo(Point),
}

/// A stroke as one continuous midpoint-smoothed path: each recorded point
/// past the first is the control point of a quadratic segment ending halfway
/// to the next point, and the path closes with a line to the last point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SmoothedPath {
    commands: Vec<PathCommand>,
    point_count: usize,
}

impl SmoothedPath {
    pub fn build(points: &[Point]) -> Self {
        let mut path = Self::default();
        path.extend(points);
        path
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn continues_into(&self, points: &[Point]) -> bool {
        if self.point_count == 0 {
            return true;
        }
        if points.len() < self.point_count {
            return false;
        }
        let first = matches!(self.commands.first(), Some(PathCommand::MoveTo(p)) if *p == points[0]);
        let last = matches!(
            self.commands.last(),
            Some(PathCommand::LineTo(p)) if *p == points[self.point_count - 1]
        );
        first && last
    }

    pub fn extend(&mut self, points: &[Point]) {
        let count = points.len();
        if count == self.point_count {
            return;
        }
        if count < self.point_count || self.point_count == 0 {
            self.commands.clear();
            self.point_count = 0;
            if count == 0 {
                return;
            }
            self.commands.push(PathCommand::MoveTo(points[0]));
        } else if let Some(PathCommand::LineTo(_)) = self.commands.last() {
            self.commands.pop();
        }

        let first_control = self.point_count.saturating_sub(1).max(1);
        for k in first_control..count.saturating_sub(1) {
            self.commands.push(PathCommand::QuadTo {
                control: points[k],
                end: points[k].midpoint(points[k + 1]),
            });
        }
        self.commands.push(PathCommand::LineTo(points[count - 1]));
        self.point_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag(count: usize) -> Vec<Point> {
        (0..count)
            .map(|i| Point::new(i as f64 * 10.0, if i % 2 == 0 { 0.0 } else { 5.0 }))
            .collect()
    }

    #[test]
    fn continuation_requires_the_same_endpoints() {
        let points = zigzag(6);
        let path = SmoothedPath::build(&points[..4]);
        assert!(path.continues_into(&points));
        assert!(path.continues_into(&points[..4]));
        assert!(!path.continues_into(&points[..3]));

        let mut moved = points.clone();
        moved[3] = Point::new(-1.0, -1.0);
        assert!(!path.continues_into(&moved));
        let mut moved = points;
        moved[0] = Point::new(-1.0, -1.0);
        assert!(!path.continues_into(&moved));

        assert!(SmoothedPath::default().continues_into(&[]));
    }

    #[test]
    fn three_points_make_one_curve() {
        let points = zigzag(3);
        let path = SmoothedPath::build(&points);
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(points[0]),
                PathCommand::QuadTo {
                    control: points[1],
                    end: Point::new(15.0, 2.5),
                },
                PathCommand::LineTo(points[2]),
            ]
        );
    }

    #[test]
    fn incremental_growth_matches_full_build() {
        let points = zigzag(40);
        let mut path = SmoothedPath::default();
        for end in [1, 2, 3, 4, 9, 10, 25, 40] {
            path.extend(&points[..end]);
            assert_eq!(path, SmoothedPath::build(&points[..end]), "prefix {end}");
        }
    }

    #[test]
    fn shrinking_rebuilds() {
        let points = zigzag(10);
        let mut path = SmoothedPath::build(&points);
        let replacement = zigzag(4);
        path.extend(&replacement);
        assert_eq!(path, SmoothedPath::build(&replacement));
        path.extend(&[]);
        assert!(path.commands().is_empty());
    }

    #[test]
    fn path_has_one_segment_per_inner_point() {
        let path = SmoothedPath::build(&zigzag(12));
        let curves = path
            .commands()
            .iter()
            .filter(|command| matches!(command, PathCommand::QuadTo { .. }))
            .count();
        assert_eq!(curves, 10);
        assert_eq!(path.point_count(), 12);
    }
}
