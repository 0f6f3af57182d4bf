use criterion::{black_box, criterion_group, criterion_main, Criterion};

use board_auth::{
    AccessPolicy, BearerTokenResolver, Identity, IdentityResolver, RequestIdentity, SigningKey,
    TokenCodec, TokenConfig,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

const KEY: [u8; 32] = [7u8; 32];

fn codec() -> Arc<TokenCodec> {
    let key = SigningKey::from_bytes(KEY.to_vec()).expect("32-byte key");
    Arc::new(TokenCodec::new(&TokenConfig::new(
        key,
        Duration::hours(24),
        Duration::hours(24),
    )))
}

/// Identity as a client would obtain it: from a signed token, via the resolver.
fn alice(codec: &Arc<TokenCodec>) -> Identity {
    let claims = serde_json::json!({
        "sub": "alice",
        "auth": "USER",
        "iat": now().timestamp(),
        "exp": now().timestamp() + 3600,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(&KEY),
    )
    .expect("sign");

    BearerTokenResolver::new(codec.clone())
        .resolve(Some(&token), now())
        .identity()
        .cloned()
        .expect("token resolves")
}

fn bench_codec(c: &mut Criterion) {
    let codec = codec();
    let identity = alice(&codec);
    let token = codec.issue(&identity, now()).expect("issue").access_token;

    c.bench_function("token_issue", |b| {
        b.iter(|| codec.issue(black_box(&identity), now()))
    });

    c.bench_function("token_verify", |b| {
        b.iter(|| codec.verify(black_box(&token), now()))
    });

    let resolver = BearerTokenResolver::new(codec.clone());
    c.bench_function("resolve_valid_token", |b| {
        b.iter(|| resolver.resolve(black_box(Some(token.as_str())), now()))
    });
    c.bench_function("resolve_garbage_token", |b| {
        b.iter(|| resolver.resolve(black_box(Some("not.a.token")), now()))
    });
}

fn bench_policy(c: &mut Criterion) {
    let policy = AccessPolicy::board_defaults();
    c.bench_function("policy_decide_fallthrough", |b| {
        b.iter(|| policy.decide(black_box("/members/me"), &RequestIdentity::Anonymous))
    });
}

criterion_group!(benches, bench_codec, bench_policy);
criterion_main!(benches);
