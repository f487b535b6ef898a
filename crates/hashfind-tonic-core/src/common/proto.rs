//! gRPC service and message definitions generated from
//! `proto/hashfind.proto`.
//!
//! ## Service
//!
//! - `Find` - Unary. Returns the last match once the search ends.
//! - `FindRange` - Server streaming. Emits each match as it is found.

tonic::include_proto!("hashfind");

/// Encoded file descriptor set for registering the service with gRPC
/// reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("hashfind_descriptor");
