use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// What the user should do next, in priority order of the checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Guidance {
    NoFace,
    MoveCloser,
    MoveBack,
    CenterFace,
    BrightenBackground,
    PlainBackground,
    Ready,
    /// The detector could not run this tick.
    DetectorUnavailable,
}

impl Guidance {
    pub fn message(self) -> &'static str {
        match self {
            Guidance::NoFace => "No face detected. Look straight at the camera.",
            Guidance::MoveCloser => "Move closer: your face should fill more of the frame.",
            Guidance::MoveBack => "Move back: your face is too close to the camera.",
            Guidance::CenterFace => "Center your face in the frame.",
            Guidance::BrightenBackground => {
                "Background is too dark. Stand in front of a light, evenly lit wall."
            }
            Guidance::PlainBackground => "Background is busy. Use a plain wall behind you.",
            Guidance::Ready => "Looks good. Hold still and capture.",
            Guidance::DetectorUnavailable => {
                "Face guidance unavailable. Use the oval guide to position your face and shoulders."
            }
        }
    }

    pub fn is_ready(self) -> bool {
        self == Guidance::Ready
    }
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Pick guidance from the individual checks.
///
/// Size outranks centering, centering outranks background, and brightness
/// outranks plainness. An unscored plainness check (`None`) never blocks.
pub fn choose(size: Ordering, centered: bool, bright: bool, plain: Option<bool>) -> Guidance {
    if size == Ordering::Less {
        Guidance::MoveCloser
    } else if size == Ordering::Greater {
        Guidance::MoveBack
    } else if !centered {
        Guidance::CenterFace
    } else if !bright {
        Guidance::BrightenBackground
    } else if plain == Some(false) {
        Guidance::PlainBackground
    } else {
        Guidance::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_outranks_everything() {
        assert_eq!(
            choose(Ordering::Less, false, false, Some(false)),
            Guidance::MoveCloser
        );
        assert_eq!(
            choose(Ordering::Greater, false, false, Some(false)),
            Guidance::MoveBack
        );
    }

    #[test]
    fn centering_before_background() {
        assert_eq!(
            choose(Ordering::Equal, false, false, Some(false)),
            Guidance::CenterFace
        );
    }

    #[test]
    fn brightness_before_plainness() {
        assert_eq!(
            choose(Ordering::Equal, true, false, Some(false)),
            Guidance::BrightenBackground
        );
        assert_eq!(
            choose(Ordering::Equal, true, true, Some(false)),
            Guidance::PlainBackground
        );
    }

    #[test]
    fn unscored_plainness_does_not_block() {
        assert_eq!(choose(Ordering::Equal, true, true, None), Guidance::Ready);
    }

    #[test]
    fn serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Guidance::MoveCloser).unwrap(),
            "\"move-closer\""
        );
    }
}
