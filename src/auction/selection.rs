//! Squad selection module
//!
//! Pure playing-eleven selection and team rating calculation. Takes
//! pre-fetched squad data and returns the chosen eleven, impact player,
//! and rating breakdown without any database operations.

use serde::Serialize;
use uuid::Uuid;

use crate::auction::rules::{
    ALL_ROUNDER_CAP, BATSMAN_CAP, BOWLER_CAP, MIN_BATSMEN, MIN_BOWLERS, MIN_WICKET_KEEPERS,
    OVERSEAS_LIMIT, RATING_WEIGHT_BALANCE, RATING_WEIGHT_BATTING, RATING_WEIGHT_BENCH,
    RATING_WEIGHT_BOWLING, WICKET_KEEPER_CAP, XI_SIZE,
};
use crate::entity::players::PlayerRole;

/// One squad entry joined with its catalog player's attributes.
///
/// `entry_id` identifies the squad entry (not the catalog player), which
/// is what the orchestration layer flags as XI / impact player.
#[derive(Clone, Debug)]
pub struct SquadCandidate {
    pub entry_id: Uuid,
    pub role: PlayerRole,
    pub overall_score: f64,
    pub batting_score: f64,
    pub bowling_score: f64,
    pub is_overseas: bool,
}

/// A viability gap in the selected eleven, reported but never auto-fixed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViabilityShortfall {
    pub wicket_keepers: usize,
    pub batsmen: usize,
    pub bowlers: usize,
    pub eleven_size: usize,
}

/// Result of selecting a playing eleven from a squad
#[derive(Clone, Debug)]
pub struct XiSelection {
    pub xi: Vec<Uuid>,
    pub impact_player: Option<Uuid>,
    pub shortfall: Option<ViabilityShortfall>,
}

/// Team rating breakdown, all components rounded to one decimal
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TeamRatingBreakdown {
    pub overall_rating: f64,
    pub batting_rating: f64,
    pub bowling_rating: f64,
    pub balance_score: f64,
    pub bench_depth: f64,
}

/// Select the playing eleven from a squad.
///
/// Candidates must be supplied in squad-entry creation order; the sort is
/// stable, so equal overall scores keep that order as the tie-break.
///
/// Greedy by overall score descending: a candidate is admitted while the
/// eleven has room, overseas players are under the limit, and the role
/// cap holds. No backtracking. The impact player is the highest-rated
/// bench entry. Minimum-viability gaps (WK >= 1, BAT >= 3, BOWL >= 2,
/// eleven of 11) are reported as a shortfall, not repaired.
pub fn select_playing_xi(candidates: &[SquadCandidate]) -> XiSelection {
    let mut ordered: Vec<&SquadCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut xi: Vec<Uuid> = Vec::with_capacity(XI_SIZE);
    let mut bench: Vec<&SquadCandidate> = Vec::new();
    let mut overseas = 0usize;
    let mut keepers = 0usize;
    let mut batsmen = 0usize;
    let mut bowlers = 0usize;
    let mut all_rounders = 0usize;

    for candidate in ordered {
        if xi.len() >= XI_SIZE {
            bench.push(candidate);
            continue;
        }
        if candidate.is_overseas && overseas >= OVERSEAS_LIMIT {
            bench.push(candidate);
            continue;
        }
        let role_ok = match candidate.role {
            PlayerRole::WicketKeeper => keepers < WICKET_KEEPER_CAP,
            PlayerRole::Batsman => batsmen < BATSMAN_CAP,
            PlayerRole::Bowler => bowlers < BOWLER_CAP,
            PlayerRole::AllRounder => all_rounders < ALL_ROUNDER_CAP,
        };
        if !role_ok {
            bench.push(candidate);
            continue;
        }

        match candidate.role {
            PlayerRole::WicketKeeper => keepers += 1,
            PlayerRole::Batsman => batsmen += 1,
            PlayerRole::Bowler => bowlers += 1,
            PlayerRole::AllRounder => all_rounders += 1,
        }
        if candidate.is_overseas {
            overseas += 1;
        }
        xi.push(candidate.entry_id);
    }

    // Bench is already in overall-score order, so its head is the impact player
    let impact_player = bench.first().map(|c| c.entry_id);

    let viable = keepers >= MIN_WICKET_KEEPERS
        && batsmen >= MIN_BATSMEN
        && bowlers >= MIN_BOWLERS
        && xi.len() == XI_SIZE;
    let shortfall = if viable {
        None
    } else {
        Some(ViabilityShortfall {
            wicket_keepers: keepers,
            batsmen,
            bowlers,
            eleven_size: xi.len(),
        })
    };

    XiSelection {
        xi,
        impact_player,
        shortfall,
    }
}

/// Calculate the rating breakdown for a squad given its selected eleven.
///
/// Batting and bowling ratings are means over the eleven. The balance
/// score grants 25 points per role whose eleven count falls in the ideal
/// band (WK == 1, BAT 3-4, BOWL 2-3, AR 1-3), 10 otherwise. Bench depth
/// is the mean overall score of the bench. The overall rating weighs
/// batting, bowling, and balance at 0.3 each and bench depth at 0.1.
/// An empty squad yields all zeros.
pub fn calculate_team_rating(
    candidates: &[SquadCandidate],
    selection: &XiSelection,
) -> TeamRatingBreakdown {
    if candidates.is_empty() {
        return TeamRatingBreakdown {
            overall_rating: 0.0,
            batting_rating: 0.0,
            bowling_rating: 0.0,
            balance_score: 0.0,
            bench_depth: 0.0,
        };
    }

    let in_xi = |c: &SquadCandidate| selection.xi.contains(&c.entry_id);
    let xi: Vec<&SquadCandidate> = candidates.iter().filter(|c| in_xi(c)).collect();
    let bench: Vec<&SquadCandidate> = candidates.iter().filter(|c| !in_xi(c)).collect();

    let batting = mean(xi.iter().map(|c| c.batting_score));
    let bowling = mean(xi.iter().map(|c| c.bowling_score));
    let bench_depth = mean(bench.iter().map(|c| c.overall_score));

    let count = |role: PlayerRole| xi.iter().filter(|c| c.role == role).count();
    let band = |n: usize, lo: usize, hi: usize| if n >= lo && n <= hi { 25.0 } else { 10.0 };
    let balance = band(count(PlayerRole::WicketKeeper), 1, 1)
        + band(count(PlayerRole::Batsman), 3, 4)
        + band(count(PlayerRole::Bowler), 2, 3)
        + band(count(PlayerRole::AllRounder), 1, 3);

    let overall = RATING_WEIGHT_BATTING * batting
        + RATING_WEIGHT_BOWLING * bowling
        + RATING_WEIGHT_BALANCE * balance
        + RATING_WEIGHT_BENCH * bench_depth;

    TeamRatingBreakdown {
        overall_rating: round1(overall),
        batting_rating: round1(batting),
        bowling_rating: round1(bowling),
        balance_score: round1(balance),
        bench_depth: round1(bench_depth),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        n: u128,
        role: PlayerRole,
        overall: f64,
        batting: f64,
        bowling: f64,
        overseas: bool,
    ) -> SquadCandidate {
        SquadCandidate {
            entry_id: Uuid::from_u128(n),
            role,
            overall_score: overall,
            batting_score: batting,
            bowling_score: bowling,
            is_overseas: overseas,
        }
    }

    fn balanced_squad() -> Vec<SquadCandidate> {
        // 14 players: 2 WK, 5 BAT, 4 BOWL, 3 AR, 6 overseas
        vec![
            candidate(1, PlayerRole::WicketKeeper, 90.0, 88.0, 20.0, false),
            candidate(2, PlayerRole::WicketKeeper, 85.0, 84.0, 15.0, true),
            candidate(3, PlayerRole::Batsman, 92.0, 95.0, 10.0, true),
            candidate(4, PlayerRole::Batsman, 89.0, 90.0, 12.0, false),
            candidate(5, PlayerRole::Batsman, 87.0, 88.0, 5.0, true),
            candidate(6, PlayerRole::Batsman, 84.0, 85.0, 8.0, false),
            candidate(7, PlayerRole::Batsman, 78.0, 81.0, 3.0, true),
            candidate(8, PlayerRole::Bowler, 88.0, 20.0, 91.0, true),
            candidate(9, PlayerRole::Bowler, 86.0, 25.0, 89.0, false),
            candidate(10, PlayerRole::Bowler, 83.0, 18.0, 86.0, true),
            candidate(11, PlayerRole::Bowler, 79.0, 15.0, 82.0, false),
            candidate(12, PlayerRole::AllRounder, 85.0, 78.0, 80.0, false),
            candidate(13, PlayerRole::AllRounder, 82.0, 74.0, 77.0, false),
            candidate(14, PlayerRole::AllRounder, 81.0, 72.0, 76.0, false),
        ]
    }

    #[test]
    fn test_xi_is_eleven_when_squad_allows() {
        let squad = balanced_squad();
        let selection = select_playing_xi(&squad);
        assert_eq!(selection.xi.len(), 11);
        assert!(selection.shortfall.is_none());
    }

    #[test]
    fn test_only_one_wicket_keeper_selected() {
        let squad = balanced_squad();
        let selection = select_playing_xi(&squad);
        let keepers = squad
            .iter()
            .filter(|c| c.role == PlayerRole::WicketKeeper && selection.xi.contains(&c.entry_id))
            .count();
        assert_eq!(keepers, 1);
        // The higher-rated keeper wins the slot
        assert!(selection.xi.contains(&Uuid::from_u128(1)));
        assert!(!selection.xi.contains(&Uuid::from_u128(2)));
    }

    #[test]
    fn test_overseas_limit_enforced() {
        let squad = balanced_squad();
        let selection = select_playing_xi(&squad);
        let overseas = squad
            .iter()
            .filter(|c| c.is_overseas && selection.xi.contains(&c.entry_id))
            .count();
        assert!(overseas <= OVERSEAS_LIMIT);
    }

    #[test]
    fn test_impact_player_is_best_bench_entry() {
        let squad = balanced_squad();
        let selection = select_playing_xi(&squad);
        let impact = selection.impact_player.unwrap();
        assert!(!selection.xi.contains(&impact));
        let impact_score = squad
            .iter()
            .find(|c| c.entry_id == impact)
            .unwrap()
            .overall_score;
        for c in &squad {
            if !selection.xi.contains(&c.entry_id) {
                assert!(c.overall_score <= impact_score);
            }
        }
    }

    #[test]
    fn test_selection_is_deterministic() {
        let squad = balanced_squad();
        let a = select_playing_xi(&squad);
        let b = select_playing_xi(&squad);
        assert_eq!(a.xi, b.xi);
        assert_eq!(a.impact_player, b.impact_player);
    }

    #[test]
    fn test_tied_scores_keep_entry_order() {
        let squad = vec![
            candidate(1, PlayerRole::Batsman, 80.0, 80.0, 0.0, false),
            candidate(2, PlayerRole::Batsman, 80.0, 80.0, 0.0, false),
            candidate(3, PlayerRole::Batsman, 80.0, 80.0, 0.0, false),
        ];
        let selection = select_playing_xi(&squad);
        assert_eq!(
            selection.xi,
            vec![Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)]
        );
    }

    #[test]
    fn test_shortfall_reported_not_repaired() {
        // No wicket keeper, only one bowler: viability gaps stay visible
        let squad = vec![
            candidate(1, PlayerRole::Batsman, 90.0, 90.0, 5.0, false),
            candidate(2, PlayerRole::Batsman, 88.0, 88.0, 5.0, false),
            candidate(3, PlayerRole::Batsman, 86.0, 86.0, 5.0, false),
            candidate(4, PlayerRole::Bowler, 84.0, 10.0, 85.0, false),
        ];
        let selection = select_playing_xi(&squad);
        assert_eq!(selection.xi.len(), 4);
        let shortfall = selection.shortfall.expect("shortfall expected");
        assert_eq!(shortfall.wicket_keepers, 0);
        assert_eq!(shortfall.bowlers, 1);
        assert_eq!(shortfall.eleven_size, 4);
    }

    #[test]
    fn test_empty_squad_yields_zero_ratings() {
        let selection = select_playing_xi(&[]);
        assert!(selection.xi.is_empty());
        assert!(selection.impact_player.is_none());
        let rating = calculate_team_rating(&[], &selection);
        assert_eq!(rating.overall_rating, 0.0);
        assert_eq!(rating.batting_rating, 0.0);
        assert_eq!(rating.bowling_rating, 0.0);
        assert_eq!(rating.balance_score, 0.0);
        assert_eq!(rating.bench_depth, 0.0);
    }

    #[test]
    fn test_balance_full_marks_in_ideal_bands() {
        let squad = balanced_squad();
        let selection = select_playing_xi(&squad);
        let rating = calculate_team_rating(&squad, &selection);
        // 1 WK, 4 BAT (cap not hit but ideal band is 3-4), bowlers and
        // all-rounders also land in band with this squad
        assert_eq!(rating.balance_score, 100.0);
    }

    #[test]
    fn test_balance_off_band_scores_ten() {
        // XI of pure batsmen: only the batsman band can possibly hold,
        // and five batsmen overshoots it
        let squad: Vec<SquadCandidate> = (1..=5)
            .map(|n| candidate(n, PlayerRole::Batsman, 80.0, 80.0, 10.0, false))
            .collect();
        let selection = select_playing_xi(&squad);
        let rating = calculate_team_rating(&squad, &selection);
        assert_eq!(rating.balance_score, 40.0);
    }

    #[test]
    fn test_rating_means_and_weights() {
        let squad = vec![
            candidate(1, PlayerRole::WicketKeeper, 80.0, 80.0, 20.0, false),
            candidate(2, PlayerRole::Batsman, 90.0, 90.0, 10.0, false),
            candidate(3, PlayerRole::Bowler, 70.0, 10.0, 90.0, false),
        ];
        let selection = select_playing_xi(&squad);
        let rating = calculate_team_rating(&squad, &selection);
        assert_eq!(rating.batting_rating, 60.0); // (80+90+10)/3
        assert_eq!(rating.bowling_rating, 40.0); // (20+10+90)/3
        assert_eq!(rating.bench_depth, 0.0);
        // Balance: WK in band, BAT and BOWL under minimum band, AR absent
        assert_eq!(rating.balance_score, 55.0);
        let expected = round1(0.3 * 60.0 + 0.3 * 40.0 + 0.3 * 55.0 + 0.1 * 0.0);
        assert_eq!(rating.overall_rating, expected);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(10.04), 10.0);
        assert_eq!(round1(10.05), 10.1);
        assert_eq!(round1(10.949), 10.9);
        assert_eq!(round1(0.0), 0.0);
    }
}
