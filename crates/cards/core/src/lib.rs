//! Trading-card content injection over a host item database.
//!
//! `cards-core` turns authored [`Definition`]s into synthesized item templates
//! and threads them through every table the host reads: locales, handbook,
//! trader assortments, static loot and market rules. Composite containers
//! (binders, album, booster) are derived from the injected set afterwards.
//!
//! The crate performs no I/O. Callers load a [`ContentStore`], a
//! [`Settings`] value and the [`CompositeShapes`], then hand them to
//! [`Pipeline::run`] together with a [`ProbabilityEngine`].
pub mod composite;
pub mod definition;
pub mod error;
pub mod filters;
pub mod inject;
pub mod pipeline;
pub mod probability;
pub mod rarity;
pub mod settings;
pub mod store;
pub mod synth;

pub use composite::{CompositeBuilder, CompositeShapes, group_by_theme, slot_id, sort_cards};
pub use definition::{Definition, ExternalSize};
pub use error::{ConfigError, ErrorSeverity, InjectError, Result};
pub use filters::{FilterExtension, ensure_compat_filters, extend_container_filters};
pub use inject::{InjectKind, InjectReport, Injector, currency_tpl};
pub use pipeline::{Failure, Pipeline, RunReport};
pub use probability::{
    BaselineTable, LootBaseline, ProbabilityEngine, compute_baselines, relative_probability,
};
pub use rarity::{Rarity, RarityCounts, RarityWeights};
pub use settings::{Settings, WritePolicy};
pub use store::{
    AssortItem, AssortStock, BarterCost, BlacklistEntry, ContentStore, Handbook, HandbookEntry,
    ItemDistribution, Locales, Location, Ragfair, RagfairDynamic, RagfairStatic,
    StaticLootContainer, Templates, Trader, TraderAssort,
};
pub use synth::{synthesize, trader_price};
