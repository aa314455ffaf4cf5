//! Integration tests for the state transition engine: phases, match lifecycle, courts, and
//! the membership invariant under random operation sequences.

use badminton_queue_web::{
    apply, apply_or_keep, available_courts, can_create_match, Category, CourtId, Gender, MatchId,
    NoOpReason, Operation, Phase, PlayerEdit, PlayerId, SessionState,
};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use std::collections::HashSet;

struct Session {
    state: SessionState,
    rng: ChaCha8Rng,
}

impl Session {
    fn new(seed: u64) -> Self {
        Session {
            state: SessionState::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// `count` male beginners on `courts` courts, rotation started.
    fn started(count: usize, courts: usize) -> Self {
        let mut s = Session::new(42);
        for n in 1..=count {
            s.add(&format!("Player {n}"), Category::Beginner, Gender::Male);
        }
        for _ in 1..courts {
            s.ok(Operation::AddCourt { name: None });
        }
        s.ok(Operation::StartRotation);
        s
    }

    fn ok(&mut self, op: Operation) {
        let name = op.name();
        self.state = apply(&self.state, op, &mut self.rng, Utc::now())
            .unwrap_or_else(|e| panic!("{name} rejected: {e}"));
    }

    fn rejected(&mut self, op: Operation) -> NoOpReason {
        let before = self.state.clone();
        let reason = apply(&self.state, op, &mut self.rng, Utc::now()).expect_err("should be rejected");
        assert_eq!(self.state, before);
        reason
    }

    fn add(&mut self, name: &str, category: Category, gender: Gender) -> PlayerId {
        self.ok(Operation::AddPlayer {
            name: name.to_string(),
            category,
            gender,
        });
        self.state
            .players
            .values()
            .find(|p| p.name == name.trim())
            .map(|p| p.id)
            .expect("player was added")
    }

    fn create_match(&mut self, court_id: Option<CourtId>) -> MatchId {
        self.ok(Operation::CreateMatch {
            court_id,
            randomize_partners: false,
        });
        self.state.matches.last().expect("match created").id
    }

    fn games(&self, id: PlayerId) -> u32 {
        self.state.player(id).expect("live player").games_played
    }
}

fn pid(n: u64) -> PlayerId {
    PlayerId::new(n)
}

#[test]
fn start_rotation_needs_four_players() {
    let mut s = Session::new(0);
    for name in ["Ana", "Ben", "Cy"] {
        s.add(name, Category::Beginner, Gender::Male);
    }
    assert_eq!(
        s.rejected(Operation::StartRotation),
        NoOpReason::NotEnoughPlayers { required: 4 }
    );
    s.add("Di", Category::Beginner, Gender::Male);
    s.ok(Operation::StartRotation);
    assert_eq!(s.state.phase, Phase::Active);
    assert_eq!(s.state.queue, vec![pid(1), pid(2), pid(3), pid(4)]);
}

#[test]
fn operations_outside_their_phase_are_rejected() {
    let mut s = Session::new(0);
    assert_eq!(
        s.rejected(Operation::CreateMatch {
            court_id: None,
            randomize_partners: false
        }),
        NoOpReason::InvalidPhase(Phase::Setup)
    );
    assert_eq!(
        s.rejected(Operation::EndRotation),
        NoOpReason::InvalidPhase(Phase::Setup)
    );

    let mut s = Session::started(4, 1);
    assert_eq!(
        s.rejected(Operation::StartRotation),
        NoOpReason::InvalidPhase(Phase::Active)
    );
    assert_eq!(
        s.rejected(Operation::ResetSetup),
        NoOpReason::InvalidPhase(Phase::Active)
    );
}

#[test]
fn player_names_are_trimmed_and_unique() {
    let mut s = Session::new(0);
    let ana = s.add("  Ana ", Category::Beginner, Gender::Female);
    assert_eq!(s.state.player(ana).unwrap().name, "Ana");
    assert_eq!(
        s.rejected(Operation::AddPlayer {
            name: "ANA".into(),
            category: Category::Beginner,
            gender: Gender::Female
        }),
        NoOpReason::DuplicatePlayerName
    );
    assert_eq!(
        s.rejected(Operation::AddPlayer {
            name: "   ".into(),
            category: Category::Beginner,
            gender: Gender::Female
        }),
        NoOpReason::EmptyName
    );
    s.ok(Operation::UpdatePlayer {
        player_id: ana,
        edit: PlayerEdit {
            category: Some(Category::Intermediate),
            ..PlayerEdit::default()
        },
    });
    assert_eq!(s.state.player(ana).unwrap().category, Category::Intermediate);
}

#[test]
fn players_added_mid_rotation_join_the_end_of_waiting() {
    let mut s = Session::started(4, 1);
    let late = s.add("Latecomer", Category::Intermediate, Gender::Female);
    assert_eq!(s.state.queue.last(), Some(&late));
    assert!(s.state.consistency_errors().is_empty());
}

#[test]
fn completing_a_match_updates_counters_and_frees_the_court() {
    let mut s = Session::started(4, 1);
    let court = s.state.courts[0].id;
    let m = s.create_match(None);
    assert!(s.state.queue.is_empty());
    assert!(available_courts(&s.state.matches, &s.state.courts).is_empty());

    s.ok(Operation::CompleteMatch {
        match_id: m,
        shuttle_used: 4,
    });
    for n in 1..=4 {
        let p = s.state.player(pid(n)).unwrap();
        assert_eq!(p.games_played, 1);
        assert_eq!(p.shuttle_share.as_shuttles(), 1.0);
    }
    assert!(s.state.matches.is_empty());
    assert_eq!(s.state.queue.len(), 4);
    assert_eq!(available_courts(&s.state.matches, &s.state.courts), vec![court]);

    let record = s.state.completed_matches.get(m).expect("record appended");
    assert_eq!(record.shuttle_used, 4);
    assert_eq!(record.court_name, "Court 1");
    assert!(!record.voided);
}

#[test]
fn cancelling_a_match_counts_nothing() {
    let mut s = Session::started(4, 1);
    let m = s.create_match(None);
    s.ok(Operation::CancelMatch { match_id: m });
    assert!(s.state.matches.is_empty());
    assert_eq!(s.state.queue.len(), 4);
    assert!(s.state.completed_matches.is_empty());
    assert!((1..=4).all(|n| s.games(pid(n)) == 0));
}

#[test]
fn create_match_without_free_court_or_players() {
    let mut s = Session::started(8, 1);
    s.create_match(None);
    assert_eq!(
        s.rejected(Operation::CreateMatch {
            court_id: None,
            randomize_partners: false
        }),
        NoOpReason::NoFreeCourt
    );

    let mut s = Session::started(5, 2);
    s.create_match(None);
    assert_eq!(
        s.rejected(Operation::CreateMatch {
            court_id: None,
            randomize_partners: false
        }),
        NoOpReason::NoLegalMatch
    );
    assert!(!can_create_match(&s.state, &mut s.rng));
}

#[test]
fn create_match_on_a_named_court() {
    let mut s = Session::started(8, 2);
    let second = s.state.courts[1].id;
    let m = s.create_match(Some(second));
    assert_eq!(s.state.match_by_id(m).unwrap().court_id, second);
    assert_eq!(
        s.rejected(Operation::CreateMatch {
            court_id: Some(second),
            randomize_partners: false
        }),
        NoOpReason::CourtOccupied(second)
    );
    assert_eq!(
        s.rejected(Operation::CreateMatch {
            court_id: Some(CourtId::new(99)),
            randomize_partners: false
        }),
        NoOpReason::CourtNotFound(CourtId::new(99))
    );
}

#[test]
fn fill_courts_uses_every_free_court() {
    let mut s = Session::started(9, 3);
    s.ok(Operation::FillCourts {
        randomize_partners: false,
    });
    assert_eq!(s.state.matches.len(), 2);
    assert_eq!(s.state.queue.len(), 1);
    assert!(s.state.consistency_errors().is_empty());
}

#[test]
fn manual_match_validation() {
    let mut s = Session::started(8, 2);
    let c1 = s.state.courts[0].id;
    let c2 = s.state.courts[1].id;

    assert_eq!(
        s.rejected(Operation::CreateManualMatch {
            team_1: vec![pid(1)],
            team_2: vec![pid(2), pid(3)],
            court_id: c1,
        }),
        NoOpReason::WrongTeamSize { team: 1, size: 1 }
    );
    assert_eq!(
        s.rejected(Operation::CreateManualMatch {
            team_1: vec![pid(1), pid(2)],
            team_2: vec![pid(2), pid(3)],
            court_id: c1,
        }),
        NoOpReason::DuplicatePlayerInMatch(pid(2))
    );

    s.ok(Operation::CreateManualMatch {
        team_1: vec![pid(1), pid(2)],
        team_2: vec![pid(3), pid(4)],
        court_id: c1,
    });
    assert_eq!(
        s.rejected(Operation::CreateManualMatch {
            team_1: vec![pid(1), pid(5)],
            team_2: vec![pid(6), pid(7)],
            court_id: c2,
        }),
        NoOpReason::PlayerUnavailable(pid(1))
    );
    assert_eq!(
        s.rejected(Operation::CreateManualMatch {
            team_1: vec![pid(5), pid(6)],
            team_2: vec![pid(7), pid(8)],
            court_id: c1,
        }),
        NoOpReason::CourtOccupied(c1)
    );
}

#[test]
fn editing_a_match_releases_dropped_players() {
    let mut s = Session::started(6, 1);
    let c1 = s.state.courts[0].id;
    s.ok(Operation::CreateManualMatch {
        team_1: vec![pid(1), pid(2)],
        team_2: vec![pid(3), pid(4)],
        court_id: c1,
    });
    let m = s.state.matches[0].id;
    s.ok(Operation::UpdateMatch {
        match_id: m,
        team_1: vec![pid(1), pid(5)],
        team_2: vec![pid(3), pid(4)],
        court_id: None,
    });
    let updated = s.state.match_by_id(m).unwrap();
    assert_eq!(updated.team_1, [pid(1), pid(5)]);
    assert!(s.state.queue.contains(&pid(2)));
    assert!(!s.state.queue.contains(&pid(5)));
    assert!(s.state.consistency_errors().is_empty());
}

#[test]
fn queued_match_reserves_players_until_promoted() {
    let mut s = Session::started(8, 1);
    let court = s.state.courts[0].id;
    s.ok(Operation::CreateManualMatch {
        team_1: vec![pid(1), pid(2)],
        team_2: vec![pid(3), pid(4)],
        court_id: court,
    });
    let on_court = s.state.matches[0].id;
    s.ok(Operation::QueueMatch {
        team_1: vec![pid(5), pid(6)],
        team_2: vec![pid(7), pid(8)],
    });
    let queued = s.state.advance_queue[0].id;
    assert!(s.state.queue.is_empty());
    assert!(s.state.is_reserved(pid(5)));

    assert_eq!(
        s.rejected(Operation::PromoteQueuedMatch {
            queued_match_id: queued,
            court_id: None
        }),
        NoOpReason::NoFreeCourt
    );

    s.ok(Operation::CompleteMatch {
        match_id: on_court,
        shuttle_used: 1,
    });
    s.ok(Operation::PromoteQueuedMatch {
        queued_match_id: queued,
        court_id: None,
    });
    assert!(s.state.advance_queue.is_empty());
    let promoted = s.state.match_by_id(queued).expect("keeps its id");
    assert_eq!(promoted.player_ids(), [pid(5), pid(6), pid(7), pid(8)]);
    assert_eq!(s.state.queue.len(), 4);
}

#[test]
fn cancelling_a_queued_match_releases_its_players() {
    let mut s = Session::started(4, 1);
    s.ok(Operation::QueueMatch {
        team_1: vec![pid(1), pid(2)],
        team_2: vec![pid(3), pid(4)],
    });
    let queued = s.state.advance_queue[0].id;
    s.ok(Operation::CancelQueuedMatch {
        queued_match_id: queued,
    });
    assert!(s.state.advance_queue.is_empty());
    assert_eq!(s.state.queue.len(), 4);
}

#[test]
fn removing_a_reserved_player_cancels_the_queued_match() {
    let mut s = Session::started(5, 1);
    s.ok(Operation::QueueMatch {
        team_1: vec![pid(1), pid(2)],
        team_2: vec![pid(3), pid(4)],
    });
    s.ok(Operation::RemovePlayer { player_id: pid(1) });

    assert!(s.state.advance_queue.is_empty());
    assert!(s.state.is_removed(pid(1)));
    assert!(s.state.player(pid(1)).is_none());
    let waiting: HashSet<PlayerId> = s.state.queue.iter().copied().collect();
    assert_eq!(waiting, HashSet::from([2, 3, 4, 5].map(pid)));
    assert!(s.state.consistency_errors().is_empty());
}

#[test]
fn players_on_court_cannot_be_removed() {
    let mut s = Session::started(4, 1);
    s.create_match(None);
    assert_eq!(
        s.rejected(Operation::RemovePlayer { player_id: pid(2) }),
        NoOpReason::PlayerIsPlaying(pid(2))
    );
}

#[test]
fn removed_players_can_be_restored_or_deleted() {
    let mut s = Session::started(6, 1);
    s.ok(Operation::RemovePlayer { player_id: pid(1) });
    s.ok(Operation::RemovePlayer { player_id: pid(2) });

    s.ok(Operation::RestorePlayer { player_id: pid(1) });
    assert_eq!(s.state.queue.last(), Some(&pid(1)));
    assert!(!s.state.is_removed(pid(1)));

    s.ok(Operation::DeletePlayerPermanently { player_id: pid(2) });
    assert!(s.state.removed_players.is_empty());
    assert_eq!(
        s.rejected(Operation::RestorePlayer { player_id: pid(2) }),
        NoOpReason::PlayerNotFound(pid(2))
    );
}

#[test]
fn restoring_is_refused_while_the_name_is_taken() {
    let mut s = Session::new(3);
    let ana = s.add("Ana", Category::Beginner, Gender::Female);
    for name in ["Ben", "Cy", "Dee"] {
        s.add(name, Category::Beginner, Gender::Male);
    }
    s.ok(Operation::StartRotation);
    s.ok(Operation::RemovePlayer { player_id: ana });
    let newcomer = s.add("ana", Category::Intermediate, Gender::Female);

    assert_eq!(
        s.rejected(Operation::RestorePlayer { player_id: ana }),
        NoOpReason::DuplicatePlayerName
    );
    assert!(s.state.is_removed(ana));

    s.ok(Operation::UpdatePlayer {
        player_id: newcomer,
        edit: PlayerEdit {
            name: Some("Ana B".into()),
            ..PlayerEdit::default()
        },
    });
    s.ok(Operation::RestorePlayer { player_id: ana });
    let names: Vec<&str> = s.state.players.values().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Ben", "Cy", "Dee", "Ana B"]);
}

#[test]
fn removing_in_setup_deletes_the_player() {
    let mut s = Session::new(0);
    let ana = s.add("Ana", Category::Beginner, Gender::Female);
    s.ok(Operation::RemovePlayer { player_id: ana });
    assert!(s.state.players.is_empty());
    assert!(s.state.removed_players.is_empty());
}

#[test]
fn switching_to_a_busy_court_swaps() {
    let mut s = Session::started(8, 2);
    let (c1, c2) = (s.state.courts[0].id, s.state.courts[1].id);
    let a = s.create_match(Some(c1));
    let b = s.create_match(Some(c2));
    let players_a = s.state.match_by_id(a).unwrap().player_ids();
    let players_b = s.state.match_by_id(b).unwrap().player_ids();

    s.ok(Operation::SwitchCourt {
        match_id: a,
        court_id: c2,
    });
    assert_eq!(s.state.match_by_id(a).unwrap().court_id, c2);
    assert_eq!(s.state.match_by_id(b).unwrap().court_id, c1);
    assert_eq!(s.state.match_by_id(a).unwrap().player_ids(), players_a);
    assert_eq!(s.state.match_by_id(b).unwrap().player_ids(), players_b);

    assert_eq!(
        s.rejected(Operation::SwitchCourt {
            match_id: a,
            court_id: c2
        }),
        NoOpReason::SameCourt
    );
}

#[test]
fn switching_to_a_free_court_moves_the_match() {
    let mut s = Session::started(4, 2);
    let (c1, c2) = (s.state.courts[0].id, s.state.courts[1].id);
    let m = s.create_match(Some(c1));
    s.ok(Operation::SwitchCourt {
        match_id: m,
        court_id: c2,
    });
    assert_eq!(s.state.match_by_id(m).unwrap().court_id, c2);
    assert_eq!(available_courts(&s.state.matches, &s.state.courts), vec![c1]);
}

#[test]
fn court_management() {
    let mut s = Session::new(0);
    let first = s.state.courts[0].id;
    assert_eq!(
        s.rejected(Operation::DeleteCourt { court_id: first }),
        NoOpReason::LastCourt
    );
    s.ok(Operation::AddCourt { name: None });
    assert_eq!(s.state.courts[1].name, "Court 2");
    s.ok(Operation::AddCourt {
        name: Some("Center".into()),
    });
    s.ok(Operation::RenameCourt {
        court_id: first,
        name: "Window".into(),
    });
    assert_eq!(s.state.court(first).unwrap().name, "Window");
    assert_eq!(
        s.rejected(Operation::RenameCourt {
            court_id: first,
            name: " ".into()
        }),
        NoOpReason::EmptyName
    );

    for name in ["Ana", "Ben", "Cy", "Di"] {
        s.add(name, Category::Beginner, Gender::Male);
    }
    s.ok(Operation::StartRotation);
    s.create_match(Some(first));
    assert_eq!(
        s.rejected(Operation::DeleteCourt { court_id: first }),
        NoOpReason::CourtInUse(first)
    );
    let center = s.state.courts[2].id;
    s.ok(Operation::DeleteCourt { court_id: center });
    assert_eq!(s.state.courts.len(), 2);
}

#[test]
fn end_rotation_returns_to_an_empty_setup() {
    let mut s = Session::started(4, 2);
    let m = s.create_match(None);
    s.ok(Operation::CompleteMatch {
        match_id: m,
        shuttle_used: 2,
    });
    s.ok(Operation::EndRotation);
    assert_eq!(s.state.phase, Phase::Setup);
    assert!(s.state.players.is_empty());
    assert!(s.state.completed_matches.is_empty());
    assert_eq!(s.state.courts.len(), 1);
}

#[test]
fn rejected_operation_keeps_state() {
    let s = Session::started(4, 1);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let kept = apply_or_keep(
        &s.state,
        Operation::CompleteMatch {
            match_id: MatchId::new(77),
            shuttle_used: 1,
        },
        &mut rng,
        Utc::now(),
    );
    assert_eq!(kept, s.state);
}

#[test]
fn operations_deserialize_from_tagged_json() {
    let op: Operation = serde_json::from_value(json!({
        "type": "complete_match",
        "matchId": "m-3",
        "shuttleUsed": 2
    }))
    .unwrap();
    assert_eq!(
        op,
        Operation::CompleteMatch {
            match_id: MatchId::new(3),
            shuttle_used: 2
        }
    );

    let op: Operation = serde_json::from_value(json!({
        "type": "create_manual_match",
        "team1": ["p-1", 2],
        "team2": ["p-3", "p-4"],
        "courtId": 1
    }))
    .unwrap();
    assert_eq!(
        op,
        Operation::CreateManualMatch {
            team_1: vec![pid(1), pid(2)],
            team_2: vec![pid(3), pid(4)],
            court_id: CourtId::new(1),
        }
    );

    let op: Operation = serde_json::from_value(json!({ "type": "start_rotation" })).unwrap();
    assert_eq!(op, Operation::StartRotation);
}

#[test]
fn homogeneous_pool_on_one_court_stays_fair() {
    for seed in 0..10 {
        let mut s = Session::started(6, 1);
        s.rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..30 {
            let m = s.create_match(None);
            s.ok(Operation::CompleteMatch {
                match_id: m,
                shuttle_used: 1,
            });
            let games: Vec<u32> = s.state.players.values().map(|p| p.games_played).collect();
            let (min, max) = (games.iter().min().unwrap(), games.iter().max().unwrap());
            if *min >= 1 {
                assert!(max - min <= 1, "seed {seed}: {games:?}");
            }
        }
    }
}

fn random_waiting(state: &SessionState, rng: &mut ChaCha8Rng, count: usize) -> Option<Vec<PlayerId>> {
    let waiting: Vec<PlayerId> = state.waiting_players().iter().map(|p| p.id).collect();
    if waiting.len() < count {
        return None;
    }
    Some(waiting.choose_multiple(rng, count).copied().collect())
}

fn random_operation(state: &SessionState, rng: &mut ChaCha8Rng, added: &mut u64) -> Operation {
    let live: Vec<PlayerId> = state.players.keys().copied().collect();
    let removed: Vec<PlayerId> = state.removed_players.iter().map(|r| r.player.id).collect();
    let court_ids: Vec<CourtId> = state.courts.iter().map(|c| c.id).collect();
    let match_ids: Vec<MatchId> = state.matches.iter().map(|m| m.id).collect();
    let queued_ids: Vec<MatchId> = state.advance_queue.iter().map(|q| q.id).collect();
    let record_ids: Vec<MatchId> = state.completed_matches.records().iter().map(|r| r.id).collect();

    let fallback = Operation::CreateMatch {
        court_id: None,
        randomize_partners: rng.gen(),
    };
    match rng.gen_range(0..12) {
        0 | 1 => fallback,
        2 | 3 => match match_ids.choose(rng) {
            Some(&match_id) => Operation::CompleteMatch {
                match_id,
                shuttle_used: rng.gen_range(0..4),
            },
            None => fallback,
        },
        4 => match match_ids.choose(rng) {
            Some(&match_id) => Operation::CancelMatch { match_id },
            None => fallback,
        },
        5 => match random_waiting(state, rng, 4) {
            Some(ids) => Operation::QueueMatch {
                team_1: ids[..2].to_vec(),
                team_2: ids[2..].to_vec(),
            },
            None => fallback,
        },
        6 => match queued_ids.choose(rng) {
            Some(&queued_match_id) if rng.gen_bool(0.7) => Operation::PromoteQueuedMatch {
                queued_match_id,
                court_id: None,
            },
            Some(&queued_match_id) => Operation::CancelQueuedMatch { queued_match_id },
            None => fallback,
        },
        7 => match live.choose(rng) {
            Some(&player_id) => Operation::RemovePlayer { player_id },
            None => fallback,
        },
        8 => match removed.choose(rng) {
            Some(&player_id) => Operation::RestorePlayer { player_id },
            None => {
                *added += 1;
                Operation::AddPlayer {
                    name: format!("Extra {added}"),
                    category: if rng.gen() { Category::Beginner } else { Category::Intermediate },
                    gender: if rng.gen() { Gender::Male } else { Gender::Female },
                }
            }
        },
        9 => match (match_ids.choose(rng), court_ids.choose(rng)) {
            (Some(&match_id), Some(&court_id)) => Operation::SwitchCourt { match_id, court_id },
            _ => fallback,
        },
        10 => match record_ids.choose(rng) {
            Some(&record_id) => Operation::ToggleVoid { record_id },
            None => fallback,
        },
        _ => {
            let target = state.matches.choose(rng).cloned();
            match (target, random_waiting(state, rng, 1)) {
                (Some(m), Some(fresh)) => Operation::UpdateMatch {
                    match_id: m.id,
                    team_1: vec![fresh[0], m.team_1[1]],
                    team_2: m.team_2.to_vec(),
                    court_id: None,
                },
                _ => fallback,
            }
        }
    }
}

#[test]
fn random_operation_sequences_keep_every_player_in_one_place() {
    let categories = [Category::Beginner, Category::Intermediate];
    let genders = [Gender::Male, Gender::Female];
    for seed in 0..30u64 {
        let mut chooser = ChaCha8Rng::seed_from_u64(seed);
        let mut s = Session::new(seed + 1000);
        for n in 0..10 {
            s.add(
                &format!("Player {n}"),
                categories[chooser.gen_range(0..2)],
                genders[chooser.gen_range(0..2)],
            );
        }
        s.ok(Operation::AddCourt { name: None });
        s.ok(Operation::AddCourt { name: None });
        s.ok(Operation::StartRotation);

        let mut added = 0;
        for step in 0..150 {
            let op = random_operation(&s.state, &mut chooser, &mut added);
            let name = op.name();
            s.state = apply_or_keep(&s.state, op, &mut s.rng, Utc::now());
            let errors = s.state.consistency_errors();
            assert!(errors.is_empty(), "seed {seed} step {step} after {name}: {errors:?}");

            let playing = s.state.playing_ids();
            let reserved = s.state.reserved_ids();
            assert!(playing.is_disjoint(&reserved));
            assert!(s.state.queue.iter().all(|id| !playing.contains(id) && !reserved.contains(id)));
            assert!(s
                .state
                .removed_players
                .iter()
                .all(|r| !s.state.players.contains_key(&r.player.id)));
        }
    }
}
