// Coupon create/update bodies share the repo's `CouponPatch` shape; nothing
// else crosses this boundary.
pub use super::repo::CouponPatch;
