// SPDX-License-Identifier: MIT

//! hotswap-bytecode: the managed-bytecode container format and the
//! structural summary ([`ClassMetadata`]) the Metadata Extractor produces
//! from it.
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod artifact;
pub mod error;
pub mod format;
pub mod metadata;

pub use artifact::{digest_hex, ClassArtifact};
pub use error::ExtractionFailed;
pub use format::{encode, parse};
pub use metadata::{ClassMetadata, FieldDescriptor, MethodDescriptor};
