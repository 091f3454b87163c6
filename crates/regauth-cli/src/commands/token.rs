//! Token commands.
//!
//! `regauth token mint` - Issue a token locally.
//! `regauth token inspect` - Decode a token's header and claims.

use super::{load_config, load_generator};
use anyhow::Context;
use regauth_token::{
    AllowAllAuthorizer, AuthorizationRequest, Authorizer, RequestContext, Scope, ScopeType, Token,
    TokenGenerator, TokenInfo, TokenOptions, inspect_token_unverified,
};
use std::fs;
use std::path::Path;

/// Parse a `--scope` value; registry scopes with an empty or `.` name become `catalog`.
pub fn parse_scope(raw: &str) -> anyhow::Result<Scope> {
    let scope: Scope = raw
        .parse()
        .with_context(|| format!("Invalid scope: {raw}"))?;

    Ok(match scope.scope_type {
        ScopeType::Registry => Scope::registry(&scope.name, scope.actions),
        ScopeType::Repository => scope,
    })
}

/// Issue a token with the configured key, granting exactly the requested actions.
pub async fn mint_token(
    config_path: &Path,
    scope: &str,
    account: Option<String>,
    service: Option<String>,
) -> anyhow::Result<Token> {
    let config = load_config(config_path)?;
    let generator = load_generator(&config)?;
    let scope = parse_scope(scope)?;

    let service = service.unwrap_or_else(|| config.token.audience.clone());
    let request = AuthorizationRequest::new(account.unwrap_or_default(), service, scope);

    let granted = AllowAllAuthorizer::new()
        .authorize(&RequestContext::default(), &request)
        .await?;

    let options = TokenOptions {
        expires_in: config.token.expires_in,
        issuer: config.token.issuer.clone(),
        audience: config.token.audience.clone(),
    };
    let token = generator.generate_token(&request, &granted, &options)?;
    Ok(token)
}

/// Mint a token and print the response JSON.
pub async fn mint(
    config_path: &Path,
    scope: &str,
    account: Option<String>,
    service: Option<String>,
) -> anyhow::Result<()> {
    let token = mint_token(config_path, scope, account, service).await?;
    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}

/// Decode a token given literally or as a path to a file containing it.
pub fn decode(token: String) -> anyhow::Result<TokenInfo> {
    let token_str = if Path::new(&token).exists() {
        fs::read_to_string(&token)?.trim().to_string()
    } else {
        token
    };

    Ok(inspect_token_unverified(&token_str)?)
}

/// Inspect a token's contents.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let info = decode(token)?;

    println!("Token Information (signature not verified):");
    println!();
    println!("Header:");
    println!("{}", serde_json::to_string_pretty(&info.header)?);
    println!();
    println!("Claims:");
    println!("{}", serde_json::to_string_pretty(&info.claims)?);
    println!();
    println!("Signature: {} bytes", info.signature.len());

    Ok(())
}
