// SPDX-License-Identifier: MIT OR Apache-2.0

use oanquan_core::{Board, Direction, GameError, Layout, PitId, PitKind};

#[test]
fn rectangle_layout_generates_canonical_order() {
    let board = Board::generate(Layout::Rectangle, 2, 10).unwrap();
    assert_eq!(board.len(), 12);

    let ids: Vec<String> = board.pits().iter().map(|p| p.id.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "q0", "p0_d0", "p0_d1", "p0_d2", "p0_d3", "p0_d4", //
            "q1", "p1_d0", "p1_d1", "p1_d2", "p1_d3", "p1_d4",
        ]
    );

    for pit in board.pits() {
        match pit.kind {
            PitKind::Quan => {
                assert_eq!(pit.owner, None);
                assert_eq!(pit.stones(), 10);
            }
            PitKind::Dan => {
                assert!(pit.owner.is_some());
                assert_eq!(pit.stones(), 5);
            }
        }
    }
}

#[test]
fn triangle_and_square_layouts_have_one_side_per_player() {
    let triangle = Board::generate(Layout::Triangle, 3, 10).unwrap();
    assert_eq!(triangle.len(), 18);
    assert_eq!(triangle.dan_pits_of(2).count(), 5);

    let square = Board::generate(Layout::Square, 4, 10).unwrap();
    assert_eq!(square.len(), 24);
    // Every side opens with its quan pit.
    assert_eq!(square.pits()[18].id, PitId::Quan(3));
    assert_eq!(
        square.pits()[19].id,
        PitId::Dan {
            player: 3,
            index: 0
        }
    );
}

#[test]
fn unsupported_combinations_are_refused() {
    assert_eq!(
        Layout::for_players(5),
        Err(GameError::UnsupportedPlayerCount(5))
    );
    assert_eq!(
        Board::generate(Layout::Triangle, 2, 10),
        Err(GameError::UnsupportedLayout {
            layout: Layout::Triangle,
            players: 2
        })
    );
    assert_eq!(
        Board::generate(Layout::Rectangle, 4, 10),
        Err(GameError::UnsupportedLayout {
            layout: Layout::Rectangle,
            players: 4
        })
    );
}

#[test]
fn neighbor_resolution_wraps_both_ways() {
    let board = Board::generate(Layout::Triangle, 3, 10).unwrap();

    // Interior step.
    assert_eq!(
        board
            .next(PitId::Dan { player: 0, index: 2 }, Direction::Forward)
            .unwrap(),
        PitId::Dan {
            player: 0,
            index: 3
        }
    );
    // Crossing a quan pit.
    assert_eq!(
        board
            .next(PitId::Dan { player: 0, index: 4 }, Direction::Forward)
            .unwrap(),
        PitId::Quan(1)
    );
    // Wrap at both ends of the sequence.
    assert_eq!(
        board
            .next(PitId::Dan { player: 2, index: 4 }, Direction::Forward)
            .unwrap(),
        PitId::Quan(0)
    );
    assert_eq!(
        board.next(PitId::Quan(0), Direction::Backward).unwrap(),
        PitId::Dan {
            player: 2,
            index: 4
        }
    );
}

#[test]
fn unknown_pit_is_a_typed_error() {
    let board = Board::generate(Layout::Rectangle, 2, 10).unwrap();
    let ghost = PitId::Dan {
        player: 3,
        index: 0,
    };
    assert_eq!(
        board.next(ghost, Direction::Forward),
        Err(GameError::PitNotFound(ghost))
    );
    assert!(board.get(ghost).is_none());
}

#[test]
fn pit_ids_render_and_parse() {
    let quan: PitId = "q2".parse().unwrap();
    assert_eq!(quan, PitId::Quan(2));

    let dan: PitId = "p1_d3".parse().unwrap();
    assert_eq!(
        dan,
        PitId::Dan {
            player: 1,
            index: 3
        }
    );
    assert_eq!(dan.to_string(), "p1_d3");

    for bad in ["", "x1", "p1d3", "q", "p_d1"] {
        assert!(matches!(
            bad.parse::<PitId>(),
            Err(GameError::InvalidPitId(_))
        ));
    }
}

#[test]
fn set_stones_is_the_single_mutation_point() {
    let mut board = Board::generate(Layout::Rectangle, 2, 10).unwrap();
    let pit = PitId::Dan {
        player: 0,
        index: 0,
    };
    board.set_stones(pit, 0).unwrap();
    assert!(board.get(pit).unwrap().is_empty());
    assert_eq!(board.total_stones(), 65);

    let ghost = PitId::Quan(9);
    assert_eq!(
        board.set_stones(ghost, 1),
        Err(GameError::PitNotFound(ghost))
    );
}
