use thiserror::Error;

/// Why an order submission or amendment was refused.
///
/// Rejections are local to the call; the book is unchanged when one is
/// returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    #[error("order quantity must be strictly positive")]
    ZeroQuantity,
    #[error("order id {0} is already live")]
    DuplicateOrderId(u64),
    #[error("order id {0} is not on the book")]
    UnknownOrder(u64),
}
