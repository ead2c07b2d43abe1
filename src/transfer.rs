//! Non-local control transfer, modeled as an ordinary `Result` value rather
//! than a host-language exception, per the evaluator's trampoline design.

use std::cell::Cell;
use std::fmt;

use crate::value::Value;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct BlockId(u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct TagbodyId(u64);

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_id() -> u64 {
    NEXT_ID.with(|cell| {
        let id = cell.get();
        cell.set(id + 1);
        id
    })
}

pub fn new_block_id() -> BlockId {
    BlockId(next_id())
}

pub fn new_tagbody_id() -> TagbodyId {
    TagbodyId(next_id())
}

/// Everything that can unwind the evaluator other than a normal return.
#[derive(Clone)]
pub enum Transfer {
    /// An unhandled signaled condition, propagating toward the top level.
    Condition(Value),
    /// `return-from` targeting the `block` that minted this id.
    Return(BlockId, Value),
    /// `throw` targeting whichever enclosing `catch` has an `eql` tag match.
    Throw(Value, Value),
    /// `go` targeting a tag within the `tagbody` that minted this id, by
    /// index into its body forms.
    Go(TagbodyId, usize),
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transfer::Condition(v) => write!(f, "Condition({v})"),
            Transfer::Return(id, v) => write!(f, "Return({id:?}, {v})"),
            Transfer::Throw(tag, v) => write!(f, "Throw({tag}, {v})"),
            Transfer::Go(id, idx) => write!(f, "Go({id:?}, {idx})"),
        }
    }
}

pub type EvalOutcome = Result<Value, Transfer>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_distinct() {
        let a = new_block_id();
        let b = new_block_id();
        assert_ne!(a, b);
    }
}
