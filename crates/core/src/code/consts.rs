//! Frequently used codes, built once and shared read-only.

use std::sync::LazyLock;

use super::MapCode;

fn constant(code_type: &'static str, pairs: &[(&'static str, &'static str)]) -> MapCode {
    MapCode::from_static(code_type, pairs.iter().copied())
}

/// `[CQ:at,qq=all]`: mention everyone.
pub static AT_ALL: LazyLock<MapCode> = LazyLock::new(|| constant("at", &[("qq", "all")]));

/// `[CQ:rps]`: rock-paper-scissors.
pub static RPS: LazyLock<MapCode> = LazyLock::new(|| constant("rps", &[]));

/// `[CQ:dice]`: roll a die.
pub static DICE: LazyLock<MapCode> = LazyLock::new(|| constant("dice", &[]));

/// `[CQ:shake]`: window shake.
pub static SHAKE: LazyLock<MapCode> = LazyLock::new(|| constant("shake", &[]));

/// `[CQ:anonymous,ignore=true]`: send anonymously, or normally if that fails.
pub static ANONYMOUS: LazyLock<MapCode> =
    LazyLock::new(|| constant("anonymous", &[("ignore", "true")]));

/// `[CQ:anonymous]`: send anonymously or not at all.
pub static ANONYMOUS_COMPULSORY: LazyLock<MapCode> =
    LazyLock::new(|| constant("anonymous", &[]));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Code;

    #[test]
    fn constants_render_canonically() {
        assert_eq!(AT_ALL.render(), "[CQ:at,qq=all]");
        assert_eq!(RPS.render(), "[CQ:rps]");
        assert_eq!(DICE.render(), "[CQ:dice]");
        assert_eq!(SHAKE.render(), "[CQ:shake]");
        assert_eq!(ANONYMOUS.render(), "[CQ:anonymous,ignore=true]");
        assert_eq!(ANONYMOUS_COMPULSORY.render(), "[CQ:anonymous]");
    }

    #[test]
    fn constants_equal_parsed_tokens() {
        let parsed = MapCode::parse("[CQ:at,qq=all]").unwrap();
        assert_eq!(*AT_ALL, parsed);
        assert_ne!(*ANONYMOUS, *ANONYMOUS_COMPULSORY);
    }
}
