use std::error::Error;
use std::fmt;

/// Raised when a textual mnemonic (an operator or keyword spelling) does not
/// name any variant of the enum it was parsed against.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParseMnemonicError {
    pub spelling: String,
    pub enum_name: &'static str,
}

impl fmt::Display for ParseMnemonicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\"{}\" is not a known {}",
            &self.spelling, &self.enum_name
        )
    }
}

impl Error for ParseMnemonicError {
    fn description(&self) -> &str {
        "failed to parse mnemonic"
    }
}

/// Parses a fieldless enum from the exact spelling used by its variants.
///
/// Implemented via `#[derive(FromMnemonic)]` (see `cx-support-derive`) for
/// enums whose variant names double as their surface-syntax spelling (e.g.
/// operator and keyword tokens).
pub trait FromMnemonic: Sized {
    fn from_mnemonic(spelling: &str) -> Result<Self, ParseMnemonicError>;
}

/// A bitset of operator classes a token can belong to.
///
/// Mirrors the spec's `relation_ops` / `unary_ops` / `add_ops` / `mul_ops` /
/// `assign_ops` predeclared sets (§6): each is one bit, and a token may
/// belong to more than one set (e.g. `-` is both a unary and an additive
/// operator).
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct OpClassSet(pub u16);

impl OpClassSet {
    pub const NONE: OpClassSet = OpClassSet(0);

    pub const fn single(bit: u16) -> OpClassSet {
        OpClassSet(1 << bit)
    }

    pub const fn contains(self, other: OpClassSet) -> bool {
        (self.0 & other.0) != 0
    }

    pub const fn union(self, other: OpClassSet) -> OpClassSet {
        OpClassSet(self.0 | other.0)
    }
}

/// Implemented via `#[derive(OpClassify)]` for a token enum whose variants
/// are annotated with `#[op_class(relation, add, ...)]`. Generates a method
/// that reports the static bitset of classes a given variant belongs to,
/// which the token cursor consults for `token_in(tok, set)` membership
/// tests (spec §6).
pub trait OpClassify {
    fn op_classes(&self) -> OpClassSet;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opclassset_union_and_contains() {
        let relation = OpClassSet::single(0);
        let add = OpClassSet::single(1);
        let both = relation.union(add);

        assert!(both.contains(relation));
        assert!(both.contains(add));
        assert!(!relation.contains(add));
    }

    #[test]
    fn parse_mnemonic_error_display() {
        let err = ParseMnemonicError {
            spelling: "???".to_string(),
            enum_name: "Token",
        };
        assert_eq!(format!("{}", err), "\"???\" is not a known Token");
    }
}
