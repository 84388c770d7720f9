pub mod lineage;
pub mod source;
pub mod ues;

pub use lineage::{build_lineage, generate_ues_id, Lineage, LineageSource};
pub use source::{
    AlphaCompetition, AlphaDataset, AlphaMatch, AlphaPlayer, AlphaSeason, AlphaTeam,
    BetaCompetition, BetaDataset, BetaMatch, BetaPlayer, BetaSeason, BetaTeam,
};
pub use ues::{EntityType, UesCompetition, UesMatch, UesPlayer, UesSeason, UesTeam};
