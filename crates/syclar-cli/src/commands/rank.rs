use clap::Subcommand;
use serde::Serialize;
use syclar_core::rank::{add_points, rank_from_points, rank_up_info, Rank, RankUpInfo};
use syclar_core::Event;

use super::{load_hero, print_json, CmdResult};

#[derive(Subcommand)]
pub enum RankAction {
    /// Print the hero's rank
    Show,
    /// Rank-up progress
    Info,
    /// Add (or with a negative delta, remove) points
    Add {
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Rank held at a point balance (does not touch the hero)
    FromPoints {
        #[arg(allow_hyphen_values = true)]
        points: i64,
    },
    /// Back to C class Rank #500
    Reset,
}

#[derive(Serialize)]
struct RankView {
    display: String,
    #[serde(flatten)]
    rank: Rank,
    prestige: u32,
}

impl From<Rank> for RankView {
    fn from(rank: Rank) -> Self {
        Self {
            display: rank.to_string(),
            rank,
            prestige: rank.prestige(),
        }
    }
}

#[derive(Serialize)]
struct RankChange {
    rank: RankView,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<Event>,
}

#[derive(Serialize)]
struct InfoView {
    rank: RankView,
    #[serde(flatten)]
    info: RankUpInfo,
}

pub fn run(action: RankAction) -> CmdResult {
    match action {
        RankAction::FromPoints { points } => print_json(&RankView::from(rank_from_points(points))),
        RankAction::Show => print_json(&RankView::from(load_hero()?.1.rank)),
        RankAction::Info => {
            let (_, hero) = load_hero()?;
            print_json(&InfoView {
                rank: hero.rank.into(),
                info: rank_up_info(&hero.rank),
            })
        }
        RankAction::Add { delta } => {
            let (ctx, mut hero) = load_hero()?;
            let before = hero.rank;
            hero.rank = add_points(&hero.rank, delta);
            hero.save(&ctx.store)?;
            print_json(&RankChange {
                rank: hero.rank.into(),
                event: Event::rank_changed(&before, &hero.rank),
            })
        }
        RankAction::Reset => {
            let (ctx, mut hero) = load_hero()?;
            hero.rank = Rank::initial();
            hero.save(&ctx.store)?;
            print_json(&RankView::from(hero.rank))
        }
    }
}
