//! Keyframes and running animations

use std::collections::BTreeMap;

use md_dom::NodeId;

use crate::Easing;

/// Animation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(pub(crate) u64);

/// How an animation settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// Ran to the end
    Completed,
    /// Stopped explicitly, or its target left the document
    Canceled,
    /// Replaced by a newer animation of the same properties on the same node
    Superseded,
}

/// Animated property value
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatedValue {
    /// Number with an optional unit (`0.5`, `12px`, `90deg`)
    Number(f64, String),
    /// Non-numeric value, switched at the midpoint
    Discrete(String),
}

impl AnimatedValue {
    /// Parse a CSS value
    pub fn parse(css: &str) -> Self {
        let css = css.trim();
        let split = css
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
            .map(|(i, _)| i)
            .unwrap_or(css.len());
        let (number, unit) = css.split_at(split);
        match number.parse::<f64>() {
            Ok(value) if unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') => {
                AnimatedValue::Number(value, unit.to_string())
            }
            _ => AnimatedValue::Discrete(css.to_string()),
        }
    }

    /// Interpolate towards `to` at eased progress `t`
    pub fn interpolate(&self, to: &AnimatedValue, t: f64) -> AnimatedValue {
        match (self, to) {
            (AnimatedValue::Number(a, unit), AnimatedValue::Number(b, other)) if unit == other || a == &0.0 => {
                AnimatedValue::Number(a + (b - a) * t, other.clone())
            }
            (a, b) => {
                if t >= 0.5 {
                    b.clone()
                } else {
                    a.clone()
                }
            }
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            AnimatedValue::Number(value, unit) => {
                let rounded = (value * 10_000.0).round() / 10_000.0;
                format!("{}{}", rounded, unit)
            }
            AnimatedValue::Discrete(s) => s.clone(),
        }
    }
}

/// One keyframe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframe {
    /// Position in the animation (0..=1); spread evenly when None
    pub offset: Option<f64>,
    pub properties: BTreeMap<String, AnimatedValue>,
}

impl Keyframe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property from its CSS value
    pub fn with(mut self, property: &str, css: &str) -> Self {
        self.properties.insert(property.to_string(), AnimatedValue::parse(css));
        self
    }

    pub fn at(mut self, offset: f64) -> Self {
        self.offset = Some(offset.clamp(0.0, 1.0));
        self
    }
}

/// Where a duration comes from
#[derive(Debug, Clone, PartialEq)]
pub enum DurationSpec {
    Token(String),
    Millis(f64),
}

/// Where an easing comes from
#[derive(Debug, Clone, PartialEq)]
pub enum EasingSpec {
    Token(String),
    Curve(Easing),
}

/// Timing for `Animator::animate_to`
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationOptions {
    pub duration: DurationSpec,
    pub easing: EasingSpec,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self::tokens("md.sys.motion.duration.medium2", "md.sys.motion.easing.standard")
    }
}

impl AnimationOptions {
    /// Timing from named tokens
    pub fn tokens(duration: &str, easing: &str) -> Self {
        Self {
            duration: DurationSpec::Token(duration.to_string()),
            easing: EasingSpec::Token(easing.to_string()),
        }
    }

    /// Literal timing
    pub fn millis(ms: f64, easing: Easing) -> Self {
        Self {
            duration: DurationSpec::Millis(ms),
            easing: EasingSpec::Curve(easing),
        }
    }
}

/// A started animation
#[derive(Debug, Clone)]
pub(crate) struct Animation {
    pub(crate) id: AnimationId,
    pub(crate) target: NodeId,
    pub(crate) keyframes: Vec<Keyframe>,
    pub(crate) duration: f64,
    pub(crate) easing: Easing,
    pub(crate) start_time: f64,
    /// Inline values the animated properties had before any animation touched them
    pub(crate) saved: Vec<(String, Option<String>)>,
}

impl Animation {
    /// Properties animated by any keyframe
    pub(crate) fn properties(&self) -> Vec<String> {
        let mut props: Vec<String> = self
            .keyframes
            .iter()
            .flat_map(|k| k.properties.keys().cloned())
            .collect();
        props.sort();
        props.dedup();
        props
    }

    /// Linear progress at `now`
    pub(crate) fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    fn offset_of(&self, index: usize) -> f64 {
        let count = self.keyframes.len();
        self.keyframes[index].offset.unwrap_or_else(|| {
            if count <= 1 {
                1.0
            } else {
                index as f64 / (count - 1) as f64
            }
        })
    }

    /// Property values at linear progress `t`
    pub(crate) fn sample(&self, t: f64) -> BTreeMap<String, AnimatedValue> {
        let mut result = BTreeMap::new();
        if self.keyframes.is_empty() {
            return result;
        }
        let eased = self.easing.apply(t);

        for property in self.properties() {
            // Keyframes carrying this property, with their offsets
            let frames: Vec<(f64, &AnimatedValue)> = (0..self.keyframes.len())
                .filter_map(|i| Some((self.offset_of(i), self.keyframes[i].properties.get(&property)?)))
                .collect();
            let Some(&(first_offset, first)) = frames.first() else {
                continue;
            };
            if frames.len() == 1 || eased <= first_offset {
                result.insert(property, first.clone());
                continue;
            }

            let mut value = frames[frames.len() - 1].1.clone();
            for pair in frames.windows(2) {
                let (from_offset, from) = pair[0];
                let (to_offset, to) = pair[1];
                if eased <= to_offset {
                    let span = to_offset - from_offset;
                    let local = if span > 0.0 { (eased - from_offset) / span } else { 1.0 };
                    value = from.interpolate(to, local);
                    break;
                }
            }
            result.insert(property, value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade(duration: f64) -> Animation {
        Animation {
            id: AnimationId(1),
            target: NodeId::NONE,
            keyframes: vec![Keyframe::new().with("opacity", "0"), Keyframe::new().with("opacity", "1")],
            duration,
            easing: Easing::Linear,
            start_time: 100.0,
            saved: Vec::new(),
        }
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(AnimatedValue::parse("12px"), AnimatedValue::Number(12.0, "px".into()));
        assert_eq!(AnimatedValue::parse("-0.5"), AnimatedValue::Number(-0.5, String::new()));
        assert_eq!(AnimatedValue::parse("auto"), AnimatedValue::Discrete("auto".into()));
        assert_eq!(AnimatedValue::parse("translateY(4px)"), AnimatedValue::Discrete("translateY(4px)".into()));
    }

    #[test]
    fn test_progress_and_sample() {
        let anim = fade(200.0);
        assert_eq!(anim.progress(100.0), 0.0);
        assert_eq!(anim.progress(200.0), 0.5);
        assert_eq!(anim.progress(900.0), 1.0);
        assert_eq!(anim.sample(0.5)["opacity"].to_css(), "0.5");
        assert_eq!(anim.sample(1.0)["opacity"].to_css(), "1");
    }

    #[test]
    fn test_offsets_and_discrete() {
        let mut anim = fade(100.0);
        anim.keyframes = vec![
            Keyframe::new().with("opacity", "0").with("visibility", "hidden"),
            Keyframe::new().with("opacity", "0.8").at(0.8),
            Keyframe::new().with("opacity", "1").with("visibility", "visible"),
        ];
        assert_eq!(anim.sample(0.4)["opacity"].to_css(), "0.4");
        assert_eq!(anim.sample(0.9)["opacity"].to_css(), "0.9");
        assert_eq!(anim.sample(0.4)["visibility"].to_css(), "hidden");
        assert_eq!(anim.sample(0.6)["visibility"].to_css(), "visible");
    }

    #[test]
    fn test_zero_duration_is_complete() {
        assert_eq!(fade(0.0).progress(0.0), 1.0);
    }
}
