//! Ellipsis fitting for trimmed lines.

/// Trailing cue drawn after trimmed text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EllipsisCue {
    /// A single period, used when even `..` does not fit.
    Dot,
    /// Two periods.
    DoubleDot,
}

impl EllipsisCue {
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Dot => ".",
            Self::DoubleDot => "..",
        }
    }
}

/// Result of fitting a prefix plus a cue into a width budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EllipsisFit {
    /// Characters kept before the cue.
    pub keep: usize,
    pub cue: EllipsisCue,
    /// Width of the kept characters plus the cue.
    pub width: u32,
}

/// Longest prefix of `advances` that still fits in `budget` followed by `..`.
///
/// `dot` and `double_dot` are the widths of the two cues in the style of the
/// last visible character. With nothing fitting, the result keeps no
/// characters and degrades to `..`, then to `.`. The single dot is returned
/// even when it overflows the budget.
#[must_use]
pub fn fit_with_ellipsis(advances: &[u32], budget: u32, dot: u32, double_dot: u32) -> EllipsisFit {
    let mut keep = 0;
    let mut kept_width = 0u32;
    for &advance in advances {
        if kept_width + advance + double_dot > budget {
            break;
        }
        kept_width += advance;
        keep += 1;
    }

    if keep > 0 || double_dot <= budget {
        EllipsisFit {
            keep,
            cue: EllipsisCue::DoubleDot,
            width: kept_width + double_dot,
        }
    } else {
        EllipsisFit {
            keep: 0,
            cue: EllipsisCue::Dot,
            width: dot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_longest_prefix() {
        let fit = fit_with_ellipsis(&[10; 10], 50, 10, 20);
        assert_eq!(fit.keep, 3);
        assert_eq!(fit.cue, EllipsisCue::DoubleDot);
        assert_eq!(fit.width, 50);
    }

    #[test]
    fn test_degrades_to_double_then_single_dot() {
        let only_cue = fit_with_ellipsis(&[30, 30], 25, 10, 20);
        assert_eq!(only_cue.keep, 0);
        assert_eq!(only_cue.cue, EllipsisCue::DoubleDot);

        let single = fit_with_ellipsis(&[30, 30], 15, 10, 20);
        assert_eq!(single.keep, 0);
        assert_eq!(single.cue, EllipsisCue::Dot);
        assert_eq!(single.width, 10);
    }

    #[test]
    fn test_zero_width_characters_are_kept() {
        let fit = fit_with_ellipsis(&[10, 0, 0, 10], 30, 10, 20);
        assert_eq!(fit.keep, 3);
        assert_eq!(fit.width, 30);
    }
}
