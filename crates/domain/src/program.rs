use std::{fmt, slice::Iter};

use derive_more::{Deref, Display, Into};

#[derive(Deref, Debug, Display, Clone, Copy, Into, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DayNumber(u8);

impl DayNumber {
    pub const ONE: DayNumber = DayNumber(1);
    pub const TWO: DayNumber = DayNumber(2);
    pub const THREE: DayNumber = DayNumber(3);
    pub const FOUR: DayNumber = DayNumber(4);

    pub fn new(value: u8) -> Result<Self, DayNumberError> {
        if !(1..=4).contains(&value) {
            return Err(DayNumberError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn iter() -> Iter<'static, DayNumber> {
        static DAYS: [DayNumber; 4] = [
            DayNumber::ONE,
            DayNumber::TWO,
            DayNumber::THREE,
            DayNumber::FOUR,
        ];
        DAYS.iter()
    }

    fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<i64> for DayNumber {
    type Error = DayNumberError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| DayNumberError::ParseError)
            .and_then(DayNumber::new)
    }
}

impl TryFrom<&str> for DayNumber {
    type Error = DayNumberError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().parse::<u8>() {
            Ok(parsed_value) => DayNumber::new(parsed_value),
            Err(_) => Err(DayNumberError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DayNumberError {
    #[error("Day must be in the range 1 to 4 ({0})")]
    OutOfRange(u8),
    #[error("Day must be an integer")]
    ParseError,
}

/// The day to train after `last_completed_day`, wrapping from the last day back to the first.
#[must_use]
pub fn next_day(last_completed_day: Option<DayNumber>) -> DayNumber {
    match last_completed_day {
        None => DayNumber::ONE,
        Some(day) => DayNumber(day.0 % 4 + 1),
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    T1,
    T2,
    T3,
}

impl Tier {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tier::T1 => "Primary",
            Tier::T2 => "Secondary",
            Tier::T3 => "Accessory",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Tier::T1 => "T1",
                Tier::T2 => "T2",
                Tier::T3 => "T3",
            }
        )
    }
}

impl TryFrom<&str> for Tier {
    type Error = TierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "T1" => Ok(Tier::T1),
            "T2" => Ok(Tier::T2),
            "T3" => Ok(Tier::T3),
            _ => Err(TierError::Unknown(value.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TierError {
    #[error("Unknown tier \"{0}\"")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exercise {
    pub name: &'static str,
    pub tier: Tier,
    pub target_sets: u32,
    pub target_reps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkoutDay {
    pub day: DayNumber,
    pub name: &'static str,
    pub exercises: &'static [Exercise],
}

impl WorkoutDay {
    #[must_use]
    pub fn num_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.target_sets).sum()
    }
}

const fn exercise(name: &'static str, tier: Tier, target_sets: u32, target_reps: u32) -> Exercise {
    Exercise {
        name,
        tier,
        target_sets,
        target_reps,
    }
}

pub static PROGRAM: [WorkoutDay; 4] = [
    WorkoutDay {
        day: DayNumber::ONE,
        name: "Upper A",
        exercises: &[
            exercise("Incline Bench Press", Tier::T1, 5, 3),
            exercise("Overhead Press", Tier::T2, 3, 10),
            exercise("Pull-ups", Tier::T3, 3, 15),
            exercise("Lateral Raises", Tier::T3, 3, 15),
        ],
    },
    WorkoutDay {
        day: DayNumber::TWO,
        name: "Legs & Posterior",
        exercises: &[
            exercise("Bulgarian Split Squats", Tier::T1, 5, 3),
            exercise("Hip Thrusts", Tier::T2, 3, 10),
            exercise("Face Pulls", Tier::T3, 3, 15),
            exercise("Calf Raises", Tier::T3, 3, 15),
        ],
    },
    WorkoutDay {
        day: DayNumber::THREE,
        name: "Upper B",
        exercises: &[
            exercise("Overhead Press", Tier::T1, 5, 3),
            exercise("Incline Bench Press", Tier::T2, 3, 10),
            exercise("Barbell Rows", Tier::T3, 3, 15),
            exercise("Dips", Tier::T3, 3, 15),
        ],
    },
    WorkoutDay {
        day: DayNumber::FOUR,
        name: "Posterior & Back",
        exercises: &[
            exercise("Hip Thrusts", Tier::T1, 5, 3),
            exercise("Barbell Rows", Tier::T2, 3, 10),
            exercise("Pull-ups", Tier::T3, 3, 15),
            exercise("Bicep Curls", Tier::T3, 3, 15),
        ],
    },
];

#[must_use]
pub fn workout_day(day: DayNumber) -> &'static WorkoutDay {
    &PROGRAM[day.index()]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, Err(DayNumberError::OutOfRange(0)))]
    #[case(1, Ok(DayNumber::ONE))]
    #[case(4, Ok(DayNumber::FOUR))]
    #[case(5, Err(DayNumberError::OutOfRange(5)))]
    fn test_day_number_new(#[case] value: u8, #[case] expected: Result<DayNumber, DayNumberError>) {
        assert_eq!(DayNumber::new(value), expected);
    }

    #[rstest]
    #[case("2", Ok(DayNumber::TWO))]
    #[case(" 3 ", Ok(DayNumber::THREE))]
    #[case("7", Err(DayNumberError::OutOfRange(7)))]
    #[case("two", Err(DayNumberError::ParseError))]
    #[case("", Err(DayNumberError::ParseError))]
    fn test_day_number_try_from_str(
        #[case] value: &str,
        #[case] expected: Result<DayNumber, DayNumberError>,
    ) {
        assert_eq!(DayNumber::try_from(value), expected);
    }

    #[rstest]
    #[case(-1, Err(DayNumberError::ParseError))]
    #[case(300, Err(DayNumberError::ParseError))]
    #[case(3, Ok(DayNumber::THREE))]
    fn test_day_number_try_from_i64(
        #[case] value: i64,
        #[case] expected: Result<DayNumber, DayNumberError>,
    ) {
        assert_eq!(DayNumber::try_from(value), expected);
    }

    #[rstest]
    #[case(None, DayNumber::ONE)]
    #[case(Some(DayNumber::ONE), DayNumber::TWO)]
    #[case(Some(DayNumber::TWO), DayNumber::THREE)]
    #[case(Some(DayNumber::THREE), DayNumber::FOUR)]
    #[case(Some(DayNumber::FOUR), DayNumber::ONE)]
    fn test_next_day(#[case] last: Option<DayNumber>, #[case] expected: DayNumber) {
        assert_eq!(next_day(last), expected);
    }

    #[rstest]
    #[case(Tier::T1, "T1", "Primary")]
    #[case(Tier::T2, "T2", "Secondary")]
    #[case(Tier::T3, "T3", "Accessory")]
    fn test_tier(#[case] tier: Tier, #[case] string: &str, #[case] label: &str) {
        assert_eq!(tier.to_string(), string);
        assert_eq!(tier.label(), label);
        assert_eq!(Tier::try_from(string), Ok(tier));
    }

    #[test]
    fn test_tier_try_from_unknown() {
        assert_eq!(
            Tier::try_from("T4"),
            Err(TierError::Unknown("T4".to_string()))
        );
    }

    #[test]
    fn test_program_days_are_ordered() {
        assert_eq!(
            PROGRAM.iter().map(|d| d.day).collect::<Vec<_>>(),
            DayNumber::iter().copied().collect::<Vec<_>>()
        );
    }

    #[rstest]
    #[case(DayNumber::ONE, "Upper A", 14)]
    #[case(DayNumber::TWO, "Legs & Posterior", 14)]
    #[case(DayNumber::THREE, "Upper B", 14)]
    #[case(DayNumber::FOUR, "Posterior & Back", 14)]
    fn test_workout_day(#[case] day: DayNumber, #[case] name: &str, #[case] num_sets: u32) {
        let workout_day = workout_day(day);
        assert_eq!(workout_day.day, day);
        assert_eq!(workout_day.name, name);
        assert_eq!(workout_day.num_sets(), num_sets);
    }

    #[test]
    fn test_workout_day_two_exercises() {
        assert_eq!(
            workout_day(DayNumber::TWO)
                .exercises
                .iter()
                .map(|e| (e.name, e.tier, e.target_sets, e.target_reps))
                .collect::<Vec<_>>(),
            vec![
                ("Bulgarian Split Squats", Tier::T1, 5, 3),
                ("Hip Thrusts", Tier::T2, 3, 10),
                ("Face Pulls", Tier::T3, 3, 15),
                ("Calf Raises", Tier::T3, 3, 15),
            ]
        );
    }
}
