//! Featured topic slider — placement engine, topic data layer, and
//! carousel viewmodel for a forum front end.
//!
//! The widget fetches a tagged subset of topics and injects a card
//! carousel at a configurable position inside the host topic list. The
//! hard part lives in [`engine`]: deciding on every navigation change and
//! every host list mutation where the slider should currently be, and
//! moving it there idempotently without duplicate nodes or flicker.

pub mod carousel;
pub mod config;
pub mod data;
pub mod dom;
pub mod engine;
pub mod route;

pub use carousel::CarouselViewModel;
pub use config::{InsertMode, SliderSettings};
pub use data::source::FeaturedTopicDataSource;
pub use data::FeaturedTopicQuery;
pub use dom::Document;
pub use engine::{EngineStatus, PlacementEngine};
pub use route::RouteInfo;
