//! Easing functions
//!
//! CSS timing functions: keywords, `cubic-bezier()` and `steps()`.

use std::fmt;

/// Timing function
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Easing {
    #[default]
    Linear,
    CubicBezier(f64, f64, f64, f64),
    Steps(u32, StepPosition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPosition {
    #[default]
    End,
    Start,
    JumpNone,
    JumpBoth,
}

impl Easing {
    pub const EASE: Easing = Easing::CubicBezier(0.25, 0.1, 0.25, 1.0);
    pub const EASE_IN: Easing = Easing::CubicBezier(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: Easing = Easing::CubicBezier(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: Easing = Easing::CubicBezier(0.42, 0.0, 0.58, 1.0);

    /// Map linear progress (0..=1) to eased progress
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
            Easing::Steps(steps, pos) => step(steps, pos, t),
        }
    }

    /// Parse a CSS timing function
    pub fn parse(css: &str) -> Option<Easing> {
        let css = css.trim();
        match css.to_ascii_lowercase().as_str() {
            "linear" => return Some(Easing::Linear),
            "ease" => return Some(Self::EASE),
            "ease-in" => return Some(Self::EASE_IN),
            "ease-out" => return Some(Self::EASE_OUT),
            "ease-in-out" => return Some(Self::EASE_IN_OUT),
            "step-start" => return Some(Easing::Steps(1, StepPosition::Start)),
            "step-end" => return Some(Easing::Steps(1, StepPosition::End)),
            _ => {}
        }

        let (name, args) = css.split_once('(')?;
        let args = args.strip_suffix(')')?;
        let args: Vec<&str> = args.split(',').map(str::trim).collect();

        match name.trim().to_ascii_lowercase().as_str() {
            "cubic-bezier" => {
                let [x1, y1, x2, y2] = args.as_slice() else {
                    return None;
                };
                let x1: f64 = x1.parse().ok()?;
                let y1: f64 = y1.parse().ok()?;
                let x2: f64 = x2.parse().ok()?;
                let y2: f64 = y2.parse().ok()?;
                // x control points must stay inside the unit interval
                if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                    return None;
                }
                Some(Easing::CubicBezier(x1, y1, x2, y2))
            }
            "steps" => {
                let count: u32 = args.first()?.parse().ok()?;
                let pos = match args.get(1).map(|s| s.to_ascii_lowercase()) {
                    None => StepPosition::End,
                    Some(p) => match p.as_str() {
                        "end" | "jump-end" => StepPosition::End,
                        "start" | "jump-start" => StepPosition::Start,
                        "jump-none" => StepPosition::JumpNone,
                        "jump-both" => StepPosition::JumpBoth,
                        _ => return None,
                    },
                };
                let min = if pos == StepPosition::JumpNone { 2 } else { 1 };
                (count >= min).then_some(Easing::Steps(count, pos))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => write!(f, "linear"),
            Easing::CubicBezier(x1, y1, x2, y2) => write!(f, "cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2),
            Easing::Steps(n, pos) => {
                let pos = match pos {
                    StepPosition::End => "jump-end",
                    StepPosition::Start => "jump-start",
                    StepPosition::JumpNone => "jump-none",
                    StepPosition::JumpBoth => "jump-both",
                };
                write!(f, "steps({}, {})", n, pos)
            }
        }
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 {
        return x;
    }
    // Polynomial coefficients for P0 = (0,0), P3 = (1,1)
    let (cx, cy) = (3.0 * x1, 3.0 * y1);
    let (bx, by) = (3.0 * (x2 - x1) - cx, 3.0 * (y2 - y1) - cy);
    let (ax, ay) = (1.0 - cx - bx, 1.0 - cy - by);

    let sample_x = |t: f64| ((ax * t + bx) * t + cx) * t;
    let sample_y = |t: f64| ((ay * t + by) * t + cy) * t;
    let slope_x = |t: f64| (3.0 * ax * t + 2.0 * bx) * t + cx;

    const EPSILON: f64 = 1e-7;

    // Newton-Raphson first, bisection if the slope flattens out
    let mut t = x;
    for _ in 0..8 {
        let err = sample_x(t) - x;
        if err.abs() < EPSILON {
            return sample_y(t);
        }
        let d = slope_x(t);
        if d.abs() < 1e-6 {
            break;
        }
        t -= err / d;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = x;
    while lo < hi {
        let value = sample_x(t);
        if (value - x).abs() < EPSILON {
            break;
        }
        if x > value {
            lo = t;
        } else {
            hi = t;
        }
        t = (hi - lo) * 0.5 + lo;
        if hi - lo < EPSILON {
            break;
        }
    }
    sample_y(t)
}

fn step(steps: u32, pos: StepPosition, t: f64) -> f64 {
    if steps == 0 {
        return t;
    }
    let n = steps as f64;
    let mut current = (t * n).floor();
    if matches!(pos, StepPosition::Start | StepPosition::JumpBoth) {
        current += 1.0;
    }
    if t >= 1.0 && matches!(pos, StepPosition::End | StepPosition::JumpNone) {
        current = n;
    }
    let jumps = match pos {
        StepPosition::JumpNone => n - 1.0,
        StepPosition::JumpBoth => n + 1.0,
        _ => n,
    };
    (current.min(jumps) / jumps).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let easing = Easing::Linear;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(0.5), 0.5);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_bezier_endpoints_and_monotonic() {
        let easing = Easing::CubicBezier(0.2, 0.0, 0.0, 1.0);
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
        let mut last = 0.0;
        for i in 1..=20 {
            let v = easing.apply(i as f64 / 20.0);
            assert!(v >= last);
            last = v;
        }
        // decelerating curve runs ahead of linear
        assert!(easing.apply(0.5) > 0.5);
    }

    #[test]
    fn test_bezier_linear_equivalent() {
        let easing = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        assert!((easing.apply(0.3) - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_steps() {
        let end = Easing::Steps(4, StepPosition::End);
        assert_eq!(end.apply(0.1), 0.0);
        assert_eq!(end.apply(0.3), 0.25);
        assert_eq!(end.apply(1.0), 1.0);
        let start = Easing::Steps(4, StepPosition::Start);
        assert_eq!(start.apply(0.1), 0.25);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Easing::parse("linear"), Some(Easing::Linear));
        assert_eq!(Easing::parse("cubic-bezier(0.2, 0, 0, 1)"), Some(Easing::CubicBezier(0.2, 0.0, 0.0, 1.0)));
        assert_eq!(Easing::parse("steps(3, jump-start)"), Some(Easing::Steps(3, StepPosition::Start)));
        assert_eq!(Easing::parse("cubic-bezier(1.5, 0, 0, 1)"), None);
        assert_eq!(Easing::parse("steps(1, jump-none)"), None);
        assert_eq!(Easing::parse("bouncy"), None);
    }

    #[test]
    fn test_display_parses_back() {
        let easing = Easing::CubicBezier(0.05, 0.7, 0.1, 1.0);
        assert_eq!(Easing::parse(&easing.to_string()), Some(easing));
    }
}
