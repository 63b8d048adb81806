use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};

use crate::{DayNumber, Weight, Workout};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutStats {
    pub total_workouts: usize,
    pub total_duration: u64,
    pub total_sets: usize,
    pub total_reps: u32,
    pub workouts_by_day: BTreeMap<DayNumber, usize>,
    /// Number of workouts per month, keyed by `YYYY-MM`.
    pub workouts_by_month: BTreeMap<String, usize>,
    pub average_duration: u32,
    pub streak_days: u32,
    pub exercise_stats: BTreeMap<String, ExerciseStats>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ExerciseStats {
    pub total_sets: usize,
    pub total_reps: u32,
    pub max_weight: Weight,
    /// Weight of the first completed set in the most recent workout with a completed set.
    pub last_weight: Weight,
}

/// Aggregate the workout history.
///
/// Dates are interpreted in the time zone of `now`. The streak counts consecutive days with at
/// least one workout, ending today.
#[must_use]
pub fn workout_stats<Tz: TimeZone>(workouts: &[Workout], now: &DateTime<Tz>) -> WorkoutStats {
    let local_date = |date: &DateTime<Utc>| date.with_timezone(&now.timezone()).date_naive();

    let mut workouts = workouts.iter().collect::<Vec<_>>();
    workouts.sort_by(|a, b| b.date.cmp(&a.date));

    let mut stats = WorkoutStats {
        total_workouts: workouts.len(),
        total_duration: 0,
        total_sets: 0,
        total_reps: 0,
        workouts_by_day: DayNumber::iter().map(|day| (*day, 0)).collect(),
        workouts_by_month: BTreeMap::new(),
        average_duration: 0,
        streak_days: streak_days(
            &workouts.iter().map(|w| local_date(&w.date)).collect::<Vec<_>>(),
            now.date_naive(),
        ),
        exercise_stats: BTreeMap::new(),
    };

    for workout in &workouts {
        stats.total_duration += u64::from(workout.duration);
        *stats.workouts_by_day.entry(workout.day).or_default() += 1;
        let date = local_date(&workout.date);
        *stats
            .workouts_by_month
            .entry(format!("{:04}-{:02}", date.year(), date.month()))
            .or_default() += 1;

        for exercise in &workout.exercises {
            let exercise_stats = stats
                .exercise_stats
                .entry(exercise.name.clone())
                .or_default();
            for set in exercise.sets.iter().filter(|s| s.completed) {
                if exercise_stats.total_sets == 0 {
                    exercise_stats.last_weight = set.weight;
                }
                stats.total_sets += 1;
                stats.total_reps += set.actual_reps;
                exercise_stats.total_sets += 1;
                exercise_stats.total_reps += set.actual_reps;
                if set.weight > exercise_stats.max_weight {
                    exercise_stats.max_weight = set.weight;
                }
            }
        }
    }

    if !workouts.is_empty() {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let average = (stats.total_duration as f64 / workouts.len() as f64).round() as u32;
        stats.average_duration = average;
    }

    stats
}

fn streak_days(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut dates = dates.to_vec();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let mut streak = 0;
    let mut expected = Some(today);
    for date in dates {
        if Some(date) != expected {
            break;
        }
        streak += 1;
        expected = date.checked_sub_days(Days::new(1));
    }
    streak
}

/// Per-workout aggregates from which the statistics and dashboard sheets are derived.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpreadsheetStatistics {
    /// Exercise names in order of first appearance.
    pub exercises: Vec<String>,
    /// One row per workout, oldest first.
    pub rows: Vec<WorkoutVolume>,
    pub total_sets: usize,
    pub total_reps: u32,
    pub total_volume: f32,
    pub workouts_by_day: [usize; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutVolume {
    pub date: DateTime<Utc>,
    pub total_volume: f32,
    pub total_reps: u32,
    /// Volume per exercise, aligned with `SpreadsheetStatistics::exercises`.
    pub exercise_volumes: Vec<f32>,
    /// Reps per exercise, aligned with `SpreadsheetStatistics::exercises`.
    pub exercise_reps: Vec<u32>,
}

impl SpreadsheetStatistics {
    #[must_use]
    pub fn total_workouts(&self) -> usize {
        self.rows.len()
    }
}

#[must_use]
pub fn spreadsheet_statistics(workouts: &[Workout]) -> SpreadsheetStatistics {
    let mut workouts = workouts.iter().collect::<Vec<_>>();
    workouts.sort_by(|a, b| a.date.cmp(&b.date));

    let mut exercises: Vec<String> = vec![];
    for (exercise, _) in workouts.iter().flat_map(|w| w.completed_sets()) {
        if !exercises.contains(&exercise.name) {
            exercises.push(exercise.name.clone());
        }
    }

    let mut statistics = SpreadsheetStatistics {
        exercises,
        ..SpreadsheetStatistics::default()
    };

    for workout in workouts {
        let mut row = WorkoutVolume {
            date: workout.date,
            total_volume: 0.0,
            total_reps: 0,
            exercise_volumes: vec![0.0; statistics.exercises.len()],
            exercise_reps: vec![0; statistics.exercises.len()],
        };
        for (exercise, set) in workout.completed_sets() {
            row.total_volume += set.volume();
            row.total_reps += set.actual_reps;
            if let Some(idx) = statistics.exercises.iter().position(|e| *e == exercise.name) {
                row.exercise_volumes[idx] += set.volume();
                row.exercise_reps[idx] += set.actual_reps;
            }
            statistics.total_sets += 1;
        }
        statistics.total_reps += row.total_reps;
        statistics.total_volume += row.total_volume;
        statistics.workouts_by_day[usize::from(*workout.day) - 1] += 1;
        statistics.rows.push(row);
    }

    statistics
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use chrono::{Duration, FixedOffset};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{ExerciseLog, SetLog, Tier, WorkoutID};

    static NOW: std::sync::LazyLock<DateTime<Utc>> =
        std::sync::LazyLock::new(|| Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap());

    fn set(actual_reps: u32, weight: f32, completed: bool) -> SetLog {
        SetLog {
            set_number: 1,
            target_reps: 10,
            actual_reps,
            weight: Weight::new(weight).unwrap(),
            completed,
        }
    }

    fn workout(id: &str, days_ago: i64, day: DayNumber, exercises: Vec<ExerciseLog>) -> Workout {
        Workout {
            id: WorkoutID::new(id).unwrap(),
            date: *NOW - Duration::days(days_ago),
            day,
            day_name: "Day".to_string(),
            duration: 1000,
            exercises,
        }
    }

    fn exercise(name: &str, sets: Vec<SetLog>) -> ExerciseLog {
        ExerciseLog {
            name: name.to_string(),
            tier: Tier::T1,
            sets,
        }
    }

    fn history() -> Vec<Workout> {
        vec![
            workout(
                "a",
                0,
                DayNumber::ONE,
                vec![
                    exercise("Pull-ups", vec![set(12, 25.0, true), set(10, 30.0, true)]),
                    exercise("Dips", vec![set(15, 0.0, false)]),
                ],
            ),
            workout(
                "b",
                1,
                DayNumber::FOUR,
                vec![exercise("Pull-ups", vec![set(15, 20.0, true), set(15, 35.0, true)])],
            ),
            workout(
                "c",
                3,
                DayNumber::ONE,
                vec![exercise("Dips", vec![set(10, 10.0, true)])],
            ),
        ]
    }

    #[test]
    fn test_workout_stats() {
        let mut older = history();
        older[2].duration = 1001;
        let stats = workout_stats(&older, &*NOW);

        assert_eq!(stats.total_workouts, 3);
        assert_eq!(stats.total_duration, 3001);
        assert_eq!(stats.total_sets, 5);
        assert_eq!(stats.total_reps, 62);
        assert_eq!(stats.average_duration, 1000);
        assert_eq!(stats.streak_days, 2);
        assert_eq!(
            stats.workouts_by_day,
            BTreeMap::from([
                (DayNumber::ONE, 2),
                (DayNumber::TWO, 0),
                (DayNumber::THREE, 0),
                (DayNumber::FOUR, 1),
            ])
        );
        assert_eq!(
            stats.workouts_by_month,
            BTreeMap::from([("2024-03".to_string(), 3)])
        );
        assert_eq!(
            stats.exercise_stats.get("Pull-ups"),
            Some(&ExerciseStats {
                total_sets: 4,
                total_reps: 52,
                max_weight: Weight::new(35.0).unwrap(),
                last_weight: Weight::new(25.0).unwrap(),
            })
        );
        assert_eq!(
            stats.exercise_stats.get("Dips"),
            Some(&ExerciseStats {
                total_sets: 1,
                total_reps: 10,
                max_weight: Weight::new(10.0).unwrap(),
                last_weight: Weight::new(10.0).unwrap(),
            })
        );
    }

    #[test]
    fn test_workout_stats_empty() {
        let stats = workout_stats(&[], &*NOW);
        assert_eq!(stats.total_workouts, 0);
        assert_eq!(stats.average_duration, 0);
        assert_eq!(stats.streak_days, 0);
        assert_eq!(stats.workouts_by_day.values().sum::<usize>(), 0);
        assert!(stats.exercise_stats.is_empty());
    }

    #[test]
    fn test_workout_stats_uses_time_zone_of_now() {
        let workouts = vec![workout("a", 0, DayNumber::ONE, vec![])];
        let ahead = FixedOffset::east_opt(6 * 3600).unwrap();
        assert_eq!(workout_stats(&workouts, &*NOW).streak_days, 1);
        assert_eq!(
            workout_stats(&workouts, &NOW.with_timezone(&ahead)).streak_days,
            1
        );
        assert_eq!(
            workout_stats(
                &workouts,
                &(NOW.with_timezone(&ahead) + Duration::days(1))
            )
            .streak_days,
            0
        );
    }

    #[rstest]
    #[case::no_workouts(&[], 0)]
    #[case::not_today(&[1, 2], 0)]
    #[case::only_today(&[0], 1)]
    #[case::multiple_per_day(&[0, 0, 1, 1], 2)]
    #[case::gap(&[0, 1, 2, 4, 5], 3)]
    fn test_streak_days(#[case] days_ago: &[u64], #[case] expected: u32) {
        let today = NOW.date_naive();
        let dates = days_ago
            .iter()
            .map(|d| today - Days::new(*d))
            .collect::<Vec<_>>();
        assert_eq!(streak_days(&dates, today), expected);
    }

    #[test]
    fn test_spreadsheet_statistics() {
        let statistics = spreadsheet_statistics(&history());

        assert_eq!(statistics.exercises, vec!["Dips", "Pull-ups"]);
        assert_eq!(statistics.total_workouts(), 3);
        assert_eq!(statistics.total_sets, 5);
        assert_eq!(statistics.total_reps, 62);
        assert_approx_eq!(statistics.total_volume, 1525.0);
        assert_eq!(statistics.workouts_by_day, [2, 0, 0, 1]);
        assert_eq!(
            statistics
                .rows
                .iter()
                .map(|r| (r.date, r.total_reps, r.exercise_reps.clone()))
                .collect::<Vec<_>>(),
            vec![
                (*NOW - Duration::days(3), 10, vec![10, 0]),
                (*NOW - Duration::days(1), 30, vec![0, 30]),
                (*NOW, 22, vec![0, 22]),
            ]
        );
        assert_approx_eq!(statistics.rows[1].total_volume, 825.0);
        assert_approx_eq!(statistics.rows[1].exercise_volumes[1], 825.0);
        assert_approx_eq!(statistics.rows[2].total_volume, 600.0);
    }

    #[test]
    fn test_spreadsheet_statistics_empty() {
        assert_eq!(spreadsheet_statistics(&[]), SpreadsheetStatistics::default());
    }
}
