pub(crate) mod coords;
pub(crate) mod runtime;
pub(crate) mod scratch;
pub(crate) mod tensor;
