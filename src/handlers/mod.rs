// Three security tiers: public (no auth), protected (JWT + tenant
// context), elevated (cross-tenant capability required).
pub mod elevated;
pub mod protected;
pub mod public;
