//! Match assembly: pick four waiting players and split them into two fair doubles teams.
//!
//! Both teams of a match must share the same gender pattern (MM, FF or MF) and the same
//! category pattern (BB, II or BI). Among every legal grouping, the one with the lowest
//! `(total games played, max games played)` wins, so the least-played players go next.
//!
//! When no balanced grouping exists and the caller allows it, a single unbalanced shape is
//! tolerated: three players of one category plus one of the other, all of the same gender
//! (the lone player is paired with one of the three).

use crate::models::{Category, Gender, Player, PlayerId, Team};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Gender shape of one team.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GenderPattern {
    MaleMale,
    FemaleFemale,
    Mixed,
}

/// Category shape of one team.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CategoryPattern {
    BeginnerBeginner,
    IntermediateIntermediate,
    Mixed,
}

pub fn gender_pattern(team: [&Player; 2]) -> GenderPattern {
    match (team[0].gender, team[1].gender) {
        (Gender::Male, Gender::Male) => GenderPattern::MaleMale,
        (Gender::Female, Gender::Female) => GenderPattern::FemaleFemale,
        _ => GenderPattern::Mixed,
    }
}

pub fn category_pattern(team: [&Player; 2]) -> CategoryPattern {
    match (team[0].category, team[1].category) {
        (Category::Beginner, Category::Beginner) => CategoryPattern::BeginnerBeginner,
        (Category::Intermediate, Category::Intermediate) => {
            CategoryPattern::IntermediateIntermediate
        }
        _ => CategoryPattern::Mixed,
    }
}

/// Both teams share gender and category patterns.
pub fn is_balanced_pairing(team_1: [&Player; 2], team_2: [&Player; 2]) -> bool {
    gender_pattern(team_1) == gender_pattern(team_2)
        && category_pattern(team_1) == category_pattern(team_2)
}

/// The fallback shape: one gender throughout, exactly three players of one category.
pub fn is_fallback_pairing(team_1: [&Player; 2], team_2: [&Player; 2]) -> bool {
    let all = [team_1[0], team_1[1], team_2[0], team_2[1]];
    let same_gender = all.iter().all(|p| p.gender == all[0].gender);
    let beginners = all
        .iter()
        .filter(|p| p.category == Category::Beginner)
        .count();
    let one_team_has_both = category_pattern(team_1) == CategoryPattern::Mixed
        || category_pattern(team_2) == CategoryPattern::Mixed;
    same_gender && (beginners == 1 || beginners == 3) && one_team_has_both
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AssembleOptions {
    /// Allow the 3-of-one-category shape when nothing balanced is possible.
    pub allow_unbalanced_fallback: bool,
    /// Reshuffle partners within the chosen four, keeping the same pattern.
    pub randomize_partners: bool,
}

/// The chosen four, already split into teams.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proposal {
    pub team_1: Team,
    pub team_2: Team,
    /// Built from the fallback shape.
    pub unbalanced: bool,
}

impl Proposal {
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team_1[0], self.team_1[1], self.team_2[0], self.team_2[1]]
    }
}

/// Output of [`assemble`]: the proposal (if any) and the waiting players it left behind,
/// in the priority order the assembler used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assembly {
    pub proposal: Option<Proposal>,
    pub remaining: Vec<PlayerId>,
}

#[derive(Clone, Copy)]
struct Candidate<'a> {
    team_1: [&'a Player; 2],
    team_2: [&'a Player; 2],
}

impl<'a> Candidate<'a> {
    fn new(team_1: [&'a Player; 2], team_2: [&'a Player; 2]) -> Self {
        Self { team_1, team_2 }
    }

    fn players(&self) -> [&'a Player; 4] {
        [self.team_1[0], self.team_1[1], self.team_2[0], self.team_2[1]]
    }

    /// Lower is better: fewest total games, then fewest games for the busiest player.
    fn score(&self) -> (u32, u32) {
        let games = self.players().map(|p| p.games_played);
        (games.iter().sum(), games.iter().copied().max().unwrap_or(0))
    }

    fn into_proposal(self, unbalanced: bool) -> Proposal {
        Proposal {
            team_1: self.team_1.map(|p| p.id),
            team_2: self.team_2.map(|p| p.id),
            unbalanced,
        }
    }
}

/// Waiting players split by (gender, category), each bucket in priority order.
struct Buckets<'a> {
    male_beginners: Vec<&'a Player>,
    male_intermediates: Vec<&'a Player>,
    female_beginners: Vec<&'a Player>,
    female_intermediates: Vec<&'a Player>,
}

impl<'a> Buckets<'a> {
    fn split(ordered: &[&'a Player]) -> Self {
        let pick = |gender: Gender, category: Category| -> Vec<&'a Player> {
            ordered
                .iter()
                .copied()
                .filter(|p| p.gender == gender && p.category == category)
                .collect()
        };
        Self {
            male_beginners: pick(Gender::Male, Category::Beginner),
            male_intermediates: pick(Gender::Male, Category::Intermediate),
            female_beginners: pick(Gender::Female, Category::Beginner),
            female_intermediates: pick(Gender::Female, Category::Intermediate),
        }
    }

    fn get(&self, gender: Gender, category: Category) -> &[&'a Player] {
        match (gender, category) {
            (Gender::Male, Category::Beginner) => &self.male_beginners,
            (Gender::Male, Category::Intermediate) => &self.male_intermediates,
            (Gender::Female, Category::Beginner) => &self.female_beginners,
            (Gender::Female, Category::Intermediate) => &self.female_intermediates,
        }
    }

    /// Every balanced grouping reachable from the front of the buckets.
    fn balanced(&self) -> Vec<Candidate<'a>> {
        let mut out = Vec::new();

        for gender in [Gender::Male, Gender::Female] {
            for category in [Category::Beginner, Category::Intermediate] {
                if let [a, b, c, d, ..] = self.get(gender, category) {
                    out.push(Candidate::new([*a, *b], [*c, *d]));
                }
            }
            if let ([b0, b1, ..], [i0, i1, ..]) = (
                self.get(gender, Category::Beginner),
                self.get(gender, Category::Intermediate),
            ) {
                out.push(Candidate::new([*b0, *i0], [*b1, *i1]));
            }
        }

        for category in [Category::Beginner, Category::Intermediate] {
            if let ([m0, m1, ..], [f0, f1, ..]) = (
                self.get(Gender::Male, category),
                self.get(Gender::Female, category),
            ) {
                out.push(Candidate::new([*m0, *f0], [*m1, *f1]));
            }
        }

        let (mb, mi) = (&self.male_beginners, &self.male_intermediates);
        let (fb, fi) = (&self.female_beginners, &self.female_intermediates);
        if let ([mb0, ..], [fi0, ..], [mi0, ..], [fb0, ..]) =
            (mb.as_slice(), fi.as_slice(), mi.as_slice(), fb.as_slice())
        {
            out.push(Candidate::new([*mb0, *fi0], [*mi0, *fb0]));
        }
        if let ([mb0, mb1, ..], [fi0, fi1, ..]) = (mb.as_slice(), fi.as_slice()) {
            out.push(Candidate::new([*mb0, *fi0], [*mb1, *fi1]));
        }
        if let ([mi0, mi1, ..], [fb0, fb1, ..]) = (mi.as_slice(), fb.as_slice()) {
            out.push(Candidate::new([*mi0, *fb0], [*mi1, *fb1]));
        }
        out
    }

    /// Three of one category with one of the other, single gender.
    fn fallback(&self) -> Vec<Candidate<'a>> {
        let mut out = Vec::new();
        for gender in [Gender::Male, Gender::Female] {
            let beginners = self.get(gender, Category::Beginner);
            let intermediates = self.get(gender, Category::Intermediate);
            if let ([b0, b1, b2, ..], [i0, ..]) = (beginners, intermediates) {
                out.push(Candidate::new([*i0, *b0], [*b1, *b2]));
            }
            if let ([b0, ..], [i0, i1, i2, ..]) = (beginners, intermediates) {
                out.push(Candidate::new([*b0, *i0], [*i1, *i2]));
            }
        }
        out
    }
}

/// Order by games played ascending, shuffling within each games-played tier so ties are
/// not always broken by queue position.
pub fn shuffle_within_ties<'a, R: Rng + ?Sized>(players: &[&'a Player], rng: &mut R) -> Vec<&'a Player> {
    let mut tiers: BTreeMap<u32, Vec<&'a Player>> = BTreeMap::new();
    for p in players {
        tiers.entry(p.games_played).or_default().push(*p);
    }
    tiers
        .into_values()
        .flat_map(|mut tier| {
            tier.shuffle(rng);
            tier
        })
        .collect()
}

/// Re-pair the chosen four without changing the match's pattern.
///
/// Mixed-gender, mixed-category matches keep their pairing: any swap would break the
/// category pattern.
fn reshuffle_partners<'a, R: Rng + ?Sized>(
    chosen: Candidate<'a>,
    unbalanced: bool,
    rng: &mut R,
) -> Candidate<'a> {
    let mut all = chosen.players();
    all.shuffle(rng);

    if unbalanced {
        let beginners = all
            .iter()
            .filter(|p| p.category == Category::Beginner)
            .count();
        let lone_category = if beginners == 1 {
            Category::Beginner
        } else {
            Category::Intermediate
        };
        let (lone, rest): (Vec<&'a Player>, Vec<&'a Player>) =
            all.iter().copied().partition(|p| p.category == lone_category);
        return match (lone.as_slice(), rest.as_slice()) {
            ([l], [a, b, c]) => Candidate::new([*l, *a], [*b, *c]),
            _ => chosen,
        };
    }

    match (gender_pattern(chosen.team_1), category_pattern(chosen.team_1)) {
        (GenderPattern::Mixed, CategoryPattern::Mixed) => chosen,
        (GenderPattern::Mixed, _) => {
            let (males, females): (Vec<&'a Player>, Vec<&'a Player>) =
                all.iter().copied().partition(|p| p.gender == Gender::Male);
            match (males.as_slice(), females.as_slice()) {
                ([m0, m1], [f0, f1]) => Candidate::new([*m0, *f0], [*m1, *f1]),
                _ => chosen,
            }
        }
        (_, CategoryPattern::Mixed) => {
            let (beginners, intermediates): (Vec<&'a Player>, Vec<&'a Player>) =
                all.iter().copied().partition(|p| p.category == Category::Beginner);
            match (beginners.as_slice(), intermediates.as_slice()) {
                ([b0, b1], [i0, i1]) => Candidate::new([*b0, *i0], [*b1, *i1]),
                _ => chosen,
            }
        }
        _ => Candidate::new([all[0], all[1]], [all[2], all[3]]),
    }
}

/// Lowest score wins; the first generated candidate wins ties.
fn best<'a>(candidates: Vec<Candidate<'a>>) -> Option<Candidate<'a>> {
    candidates.into_iter().min_by_key(|c| c.score())
}

/// Propose the best legal match among `waiting`, or none.
pub fn assemble<R: Rng + ?Sized>(
    waiting: &[&Player],
    options: AssembleOptions,
    rng: &mut R,
) -> Assembly {
    let ordered = shuffle_within_ties(waiting, rng);
    let buckets = Buckets::split(&ordered);

    let chosen = match best(buckets.balanced()) {
        Some(c) => Some((c, false)),
        None if options.allow_unbalanced_fallback => best(buckets.fallback()).map(|c| (c, true)),
        None => None,
    };

    let proposal = chosen.map(|(candidate, unbalanced)| {
        let candidate = if options.randomize_partners {
            reshuffle_partners(candidate, unbalanced, rng)
        } else {
            candidate
        };
        log::debug!(
            "Assembled {} + {} vs {} + {} (score {:?}{})",
            candidate.team_1[0].name,
            candidate.team_1[1].name,
            candidate.team_2[0].name,
            candidate.team_2[1].name,
            candidate.score(),
            if unbalanced { ", unbalanced" } else { "" }
        );
        candidate.into_proposal(unbalanced)
    });

    let taken = proposal.as_ref().map(Proposal::player_ids);
    let remaining = ordered
        .iter()
        .map(|p| p.id)
        .filter(|id| taken.map_or(true, |t| !t.contains(id)))
        .collect();

    Assembly {
        proposal,
        remaining,
    }
}
