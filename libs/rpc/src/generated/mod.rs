// @generated
// This file wires up buf-generated protobuf code
// Note: The prost files already include!() the tonic files automatically

pub mod accounts {
    include!("accounts.v1.rs");
    // accounts.v1.tonic.rs is auto-included by accounts.v1.rs
}
