use super::*;
use crate::fixtures::{self, HandBuilder, ThumbPosition};
use crate::landmarks::{Landmark, INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, THUMB_MCP, THUMB_TIP};

fn matching_letters(landmarks: &[Landmark]) -> Vec<Letter> {
    let classification = classify(Some(landmarks));
    Letter::SEQUENCE
        .iter()
        .copied()
        .filter(|&l| classification.matches_letter(l))
        .collect()
}

#[test]
fn test_each_letter_fixture_matches_only_its_letter() {
    for letter in Letter::SEQUENCE {
        let hand = fixtures::letter_hand(letter);
        assert_eq!(
            matching_letters(&hand),
            vec![letter],
            "fixture for {} matched the wrong letters",
            letter
        );
        assert!(!classify(Some(&hand)).thumbs_up);
    }
}

#[test]
fn test_thumbs_up_fixture() {
    let classification = classify(Some(&fixtures::thumbs_up_hand()));
    assert!(classification.thumbs_up);
    assert!(classification.poses() == vec![Pose::ThumbsUp]);
}

#[test]
fn test_open_hand_matches_nothing() {
    let classification = classify(Some(&fixtures::open_hand()));
    assert!(classification.is_valid());
    assert!(classification.poses().is_empty());
}

#[test]
fn test_absent_or_short_input_is_no_match() {
    let absent = classify(None);
    assert_eq!(absent, Classification::none());
    assert!(!absent.is_valid());

    let hand = fixtures::letter_hand(Letter::I);
    let short = classify(Some(&hand[..LANDMARK_COUNT - 1]));
    assert!(!short.is_valid());
    assert!(short.poses().is_empty());

    assert!(classify(Some(&[])).poses().is_empty());
}

#[test]
fn test_extra_landmarks_are_ignored() {
    let mut hand = fixtures::letter_hand(Letter::V);
    hand.push(Landmark::flat(0.9, 0.9));
    assert_eq!(matching_letters(&hand), vec![Letter::V]);
}

#[test]
fn test_o_when_tips_coincide() {
    let mut hand = fixtures::open_hand();
    hand[THUMB_TIP] = Landmark::new(0.5, 0.5, 0.0);
    hand[INDEX_TIP] = Landmark::new(0.5, 0.5, 0.0);
    assert!(classify(Some(&hand)).matches_letter(Letter::O));
}

#[test]
fn test_no_o_at_distance_point_twelve() {
    let mut hand = fixtures::open_hand();
    hand[THUMB_TIP] = Landmark::new(0.5, 0.5, 0.0);
    hand[INDEX_TIP] = Landmark::new(0.62, 0.5, 0.0);
    assert!(!classify(Some(&hand)).matches_letter(Letter::O));
}

#[test]
fn test_o_uses_depth() {
    let mut hand = fixtures::open_hand();
    hand[THUMB_TIP] = Landmark::new(0.5, 0.5, 0.0);
    hand[INDEX_TIP] = Landmark::new(0.5, 0.5, 0.1);
    assert!(!classify(Some(&hand)).matches_letter(Letter::O));

    hand[INDEX_TIP].z = 0.05;
    assert!(classify(Some(&hand)).matches_letter(Letter::O));
}

#[test]
fn test_thumb_bands_overlap() {
    let thresholds = Thresholds::default();
    let mut hand = HandBuilder::new().thumb(ThumbPosition::Out).build();
    let base_spread = (hand[THUMB_MCP].x - hand[INDEX_MCP].x).abs();

    // Just past the base spread: extended, and still inside the 1.2x curled band
    hand[THUMB_TIP].x = hand[INDEX_MCP].x - base_spread * 1.1;
    assert!(is_extended(&hand, Finger::Thumb));
    assert!(is_curled(&hand, Finger::Thumb, &thresholds));

    // Beyond 1.2x: extended only
    hand[THUMB_TIP].x = hand[INDEX_MCP].x - base_spread * 1.5;
    assert!(is_extended(&hand, Finger::Thumb));
    assert!(!is_curled(&hand, Finger::Thumb, &thresholds));

    // Inside the base spread: curled only
    hand[THUMB_TIP].x = hand[INDEX_MCP].x - base_spread * 0.5;
    assert!(!is_extended(&hand, Finger::Thumb));
    assert!(is_curled(&hand, Finger::Thumb, &thresholds));
}

#[test]
fn test_finger_neither_extended_nor_curled() {
    // Tip level with the PIP joint: neither strictly above nor below
    let mut hand = fixtures::letter_hand(Letter::E);
    hand[INDEX_TIP].y = hand[INDEX_MCP + 1].y;
    let state = classify(Some(&hand)).fingers.unwrap().finger(Finger::Index);
    assert!(!state.extended);
    assert!(!state.curled);
}

#[test]
fn test_tie_break_hand_matches_i_and_o() {
    let hand = fixtures::tie_break_hand();
    assert_eq!(matching_letters(&hand), vec![Letter::I, Letter::O]);

    let classification = classify(Some(&hand));
    assert_eq!(classification.first_letter_where(|_| false), Some(Letter::I));
    assert_eq!(
        classification.first_letter_where(|l| l == Letter::I),
        Some(Letter::O)
    );
    assert_eq!(
        classification.first_letter_where(|l| l == Letter::I || l == Letter::O),
        None
    );
}

#[test]
fn test_classification_is_deterministic() {
    for letter in Letter::SEQUENCE {
        let hand = fixtures::letter_hand(letter);
        assert_eq!(classify(Some(&hand)), classify(Some(&hand)));
    }
}

#[test]
fn test_translation_does_not_change_pose() {
    let hand = HandBuilder::new()
        .extend(Finger::Index)
        .extend(Finger::Middle)
        .shifted(0.1, -0.05)
        .build();
    assert_eq!(matching_letters(&hand), vec![Letter::V]);
}

#[test]
fn test_custom_touch_threshold() {
    let mut hand = fixtures::open_hand();
    hand[THUMB_TIP] = Landmark::new(0.5, 0.5, 0.0);
    hand[INDEX_TIP] = Landmark::new(0.62, 0.5, 0.0);

    let loose = Thresholds {
        touch_threshold: 0.15,
        ..Thresholds::default()
    };
    assert!(check_pose(Some(&hand), Pose::Letter(Letter::O), &loose));
    assert!(!check_pose(
        Some(&hand),
        Pose::Letter(Letter::O),
        &Thresholds::default()
    ));
}

#[test]
fn test_letter_parsing() {
    assert_eq!("v".parse::<Letter>(), Ok(Letter::V));
    assert_eq!(" U ".parse::<Letter>(), Ok(Letter::U));
    assert!("X".parse::<Letter>().is_err());
    assert!("IL".parse::<Letter>().is_err());
    assert_eq!(Letter::O.to_string(), "O");
    for (i, letter) in Letter::SEQUENCE.iter().enumerate() {
        assert_eq!(letter.index(), i);
        assert!(!letter.hint().is_empty());
    }
}
