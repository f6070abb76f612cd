use actix_web::http::header::{HeaderName, HeaderValue};
use anyhow::{bail, Result};
use log::debug;

use super::{RequestContext, NAMESPACE_HEADER};

/// Picks the namespace of the request and writes it to the namespace header.
///
/// A namespace declared by the caller is kept verbatim. Otherwise the issuer
/// of the account is used, then the domain of the endpoint.
pub fn resolve(ctx: RequestContext) -> Result<RequestContext> {
    if let Some(declared) = ctx.headers.get(NAMESPACE_HEADER) {
        if !declared.is_empty() {
            let namespace = String::from_utf8_lossy(declared.as_bytes()).into_owned();
            return Ok(RequestContext { namespace, ..ctx });
        }
    }

    let namespace = match ctx.account.as_ref() {
        Some(account) => account.issuer.clone(),
        None => ctx.endpoint.domain.clone(),
    };
    let value = match HeaderValue::from_str(&namespace) {
        Ok(value) => value,
        Err(_) => bail!("invalid namespace '{namespace}'"),
    };

    let mut headers = ctx.headers;
    headers.insert(HeaderName::from_static(NAMESPACE_HEADER), value);
    Ok(RequestContext {
        headers,
        namespace,
        ..ctx
    })
}

/// Drops the account if it was not issued by the request namespace.
pub fn scope_account(ctx: RequestContext) -> RequestContext {
    let foreign = ctx
        .account
        .as_ref()
        .is_some_and(|account| account.issuer != ctx.namespace);
    if !foreign {
        return ctx;
    }

    debug!(
        "Account issued by another namespace, treating request in '{}' as anonymous",
        ctx.namespace
    );
    RequestContext {
        account: None,
        ..ctx
    }
}
