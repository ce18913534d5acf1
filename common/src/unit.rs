//! Marker types.

/// Marker type describing a start of a period.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing an end of a period.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type describing a payment.
#[derive(Clone, Copy, Debug)]
pub struct Payment;

/// Marker type describing an amount adjustment.
#[derive(Clone, Copy, Debug)]
pub struct Adjustment;
