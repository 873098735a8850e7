// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller owner references.
//!
//! Every child carries exactly one controller reference pointing at the instance that
//! produced it. The cluster garbage collector uses it to delete children with their
//! owner, and the watch mappers use it to route child events back to the owner.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("owner {kind} has no {field}")]
    MissingOwnerField { kind: String, field: &'static str },

    #[error("child namespace {child} differs from owner namespace {owner}")]
    NamespaceMismatch { child: String, owner: String },

    #[error("child is already controlled by {kind} {name}")]
    AlreadyControlled { kind: String, name: String },
}

/// Build the controller reference for `owner`.
///
/// # Errors
///
/// Fails when the owner has no name or no uid, which happens for objects that were
/// never persisted.
pub fn controller_owner_reference<P>(owner: &P) -> Result<OwnerReference, OwnershipError>
where
    P: Resource<DynamicType = ()>,
{
    let kind = P::kind(&()).to_string();
    let meta = owner.meta();
    let name = meta
        .name
        .clone()
        .ok_or_else(|| OwnershipError::MissingOwnerField {
            kind: kind.clone(),
            field: "name",
        })?;
    let uid = meta
        .uid
        .clone()
        .ok_or_else(|| OwnershipError::MissingOwnerField {
            kind: kind.clone(),
            field: "uid",
        })?;

    Ok(OwnerReference {
        api_version: P::api_version(&()).to_string(),
        kind,
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// Install `owner_ref` as the controller reference of a child in `owner_namespace`.
///
/// Setting the same reference twice is a no-op.
///
/// # Errors
///
/// Fails when the child lives in another namespace or is controlled by a different owner.
pub fn set_controller_reference(
    child: &mut ObjectMeta,
    owner_ref: &OwnerReference,
    owner_namespace: &str,
) -> Result<(), OwnershipError> {
    if let Some(ns) = child.namespace.as_deref() {
        if ns != owner_namespace {
            return Err(OwnershipError::NamespaceMismatch {
                child: ns.to_string(),
                owner: owner_namespace.to_string(),
            });
        }
    }

    let refs = child.owner_references.get_or_insert_with(Vec::new);
    if let Some(existing) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner_ref.uid)
    {
        return Err(OwnershipError::AlreadyControlled {
            kind: existing.kind.clone(),
            name: existing.name.clone(),
        });
    }

    refs.retain(|r| r.uid != owner_ref.uid);
    refs.push(owner_ref.clone());
    Ok(())
}

/// The controller reference of an object, if any.
#[must_use]
pub fn controller_of(meta: &ObjectMeta) -> Option<&OwnerReference> {
    meta.owner_references
        .as_ref()?
        .iter()
        .find(|r| r.controller == Some(true))
}
