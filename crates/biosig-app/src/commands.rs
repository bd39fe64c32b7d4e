use anyhow::Result;
use biosig_core::{Outcome, PlainPayload, SignedPayload};
use biosig_crypto::SecureKeyStore;
use serde::Serialize;

use crate::setup::Context;

/// Print an outcome as JSON. Returns whether it succeeded.
fn emit<T: Serialize>(outcome: &Outcome<T>) -> Result<bool> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(outcome.is_succeeded())
}

#[derive(Serialize)]
struct StatusReport {
    alias: String,
    availability: biosig_core::Availability,
    enrollment_id: String,
    key_present: bool,
    biometric_changed: bool,
    fingerprint: Option<String>,
}

pub fn status(ctx: &Context) -> Result<bool> {
    let alias = ctx.manager.alias().as_str();
    let fingerprint = ctx
        .store
        .get_public_key(alias)
        .ok()
        .and_then(|pk| pk.fingerprint().ok());
    let report = StatusReport {
        alias: alias.to_string(),
        availability: ctx.manager.availability(),
        enrollment_id: ctx.store.enrollment_id()?,
        key_present: ctx.store.contains_alias(alias)?,
        biometric_changed: ctx.manager.is_biometric_changed(),
        fingerprint,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(true)
}

pub async fn create_key(ctx: &Context, keep_on_enrollment_change: bool) -> Result<bool> {
    let mut info = ctx.config.prompt.prompt_info();
    if keep_on_enrollment_change {
        info.invalidated_by_enrollment = false;
    }
    emit(&ctx.manager.create_key_pair(&info).await)
}

pub async fn sign(ctx: &Context, payload: String) -> Result<bool> {
    let info = ctx.config.prompt.prompt_info();
    emit(&ctx.manager.sign(&info, &PlainPayload(payload)).await)
}

pub async fn verify(ctx: &Context, payload: String, signature: String) -> Result<bool> {
    let info = ctx.config.prompt.prompt_info();
    let provider = SignedPayload::new(payload, signature);
    emit(&ctx.manager.verify(&info, &provider).await)
}

pub fn check_changed(ctx: &Context) -> Result<bool> {
    println!("{}", ctx.manager.is_biometric_changed());
    Ok(true)
}

pub fn delete_key(ctx: &Context) -> Result<bool> {
    let deleted = ctx.store.delete_key_pair(ctx.manager.alias().as_str());
    println!("{deleted}");
    Ok(deleted)
}

pub fn public_key(ctx: &Context, pem: bool) -> Result<bool> {
    let pk = ctx.store.get_public_key(ctx.manager.alias().as_str())?;
    if pem {
        print!("{}", pk.to_pem()?);
    } else {
        println!("{}", pk.to_base64()?);
    }
    Ok(true)
}
