//! Integration specifications for the observation scheduling and scoring
//! workflow.
//!
//! Scenarios run end-to-end through the public service facades and the HTTP
//! router, so conflict checking, progression gating, the schedule lifecycle,
//! and scoring are validated without reaching into private modules.

mod common {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

    use copus_tracker::workflows::observation::{
        Actor, CopusPass, EngagementLevel, EvaluationService, IntervalObservation,
        LoggingAuditSink, MemoryCompletionLedger, MemoryIdentityDirectory, MemoryRecordRepository,
        MemoryScheduleRepository, PersonId, PersonRef, PersonRole, ScheduleRequest,
        SchedulingService, Semester, SessionWindow, StudentAction, TeacherAction,
    };

    pub(super) struct Services {
        pub(super) scheduling: SchedulingService<
            MemoryScheduleRepository,
            MemoryCompletionLedger,
            MemoryIdentityDirectory,
            LoggingAuditSink,
        >,
        pub(super) evaluation: EvaluationService<
            MemoryScheduleRepository,
            MemoryRecordRepository,
            MemoryCompletionLedger,
            LoggingAuditSink,
        >,
        pub(super) completion: Arc<MemoryCompletionLedger>,
    }

    pub(super) fn services() -> Services {
        let schedules = Arc::new(MemoryScheduleRepository::default());
        let records = Arc::new(MemoryRecordRepository::default());
        let completion = Arc::new(MemoryCompletionLedger::default());
        let identity = Arc::new(MemoryIdentityDirectory::default());
        let audit = Arc::new(LoggingAuditSink);

        let roster = [
            ("fac-101", PersonRole::Faculty, "Chemistry"),
            ("fac-202", PersonRole::Faculty, "Biology"),
            ("obs-301", PersonRole::Observer, "Center for Teaching"),
            ("coord-001", PersonRole::Coordinator, "Center for Teaching"),
        ];
        for (id, role, department) in roster {
            identity.seed(PersonRef {
                id: PersonId(id.to_string()),
                name: id.to_string(),
                role,
                department: department.to_string(),
            });
        }

        Services {
            scheduling: SchedulingService::new(
                schedules.clone(),
                completion.clone(),
                identity,
                audit.clone(),
            ),
            evaluation: EvaluationService::new(schedules, records, completion.clone(), audit),
            completion,
        }
    }

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn window(start_hour: u32, end_hour: u32) -> SessionWindow {
        SessionWindow {
            date: NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date"),
            start: NaiveTime::from_hms_opt(start_hour, 0, 0).expect("valid time"),
            end: NaiveTime::from_hms_opt(end_hour, 0, 0).expect("valid time"),
        }
    }

    pub(super) fn observer() -> Actor {
        Actor {
            id: PersonId("obs-301".to_string()),
            role: PersonRole::Observer,
        }
    }

    pub(super) fn coordinator() -> Actor {
        Actor {
            id: PersonId("coord-001".to_string()),
            role: PersonRole::Coordinator,
        }
    }

    pub(super) fn request(
        faculty: &str,
        pass: CopusPass,
        semester: Semester,
        start_hour: u32,
        end_hour: u32,
    ) -> ScheduleRequest {
        ScheduleRequest {
            faculty_id: PersonId(faculty.to_string()),
            observer_id: observer().id,
            copus_pass: pass,
            semester,
            academic_year: "2025-2026".to_string(),
            window: window(start_hour, end_hour),
            subject_name: "General Chemistry".to_string(),
            subject_type: "Lecture".to_string(),
            room: "SCI-204".to_string(),
        }
    }

    /// 45 intervals: 20 High, 15 Medium, 10 Low, no actions marked.
    pub(super) fn engagement_only_session() -> Vec<IntervalObservation> {
        (1..=45u8)
            .map(|n| {
                let engagement = if n <= 20 {
                    EngagementLevel::High
                } else if n <= 35 {
                    EngagementLevel::Medium
                } else {
                    EngagementLevel::Low
                };
                IntervalObservation {
                    interval_number: n,
                    student_actions: BTreeSet::new(),
                    teacher_actions: BTreeSet::new(),
                    engagement,
                    comment: None,
                }
            })
            .collect()
    }

    /// A lively active-learning session: group work and guided facilitation
    /// in every interval.
    pub(super) fn active_learning_session() -> Vec<IntervalObservation> {
        (1..=45u8)
            .map(|n| IntervalObservation {
                interval_number: n,
                student_actions: [
                    StudentAction::GroupWork,
                    StudentAction::AskingQuestion,
                    StudentAction::AnsweringQuestion,
                    StudentAction::WholeClassDiscussion,
                    StudentAction::IndividualWork,
                    StudentAction::Listening,
                    StudentAction::Presenting,
                ]
                .into_iter()
                .collect(),
                teacher_actions: [
                    TeacherAction::MovingAndGuiding,
                    TeacherAction::PosingQuestion,
                    TeacherAction::AnsweringQuestion,
                    TeacherAction::FollowUp,
                    TeacherAction::OneOnOne,
                    TeacherAction::Lecturing,
                    TeacherAction::RealTimeWriting,
                    TeacherAction::DemoOrVideo,
                ]
                .into_iter()
                .collect(),
                engagement: EngagementLevel::High,
                comment: (n == 1).then(|| "strong start".to_string()),
            })
            .collect()
    }
}

mod scheduling {
    use super::common::{coordinator, now, observer, request, services};
    use copus_tracker::workflows::observation::{
        CopusPass, GateError, ScheduleStatus, SchedulingError, Semester,
    };

    #[test]
    fn overlapping_observer_windows_cannot_both_book() {
        let svc = services();

        svc.scheduling
            .request_schedule(
                request("fac-101", CopusPass::First, Semester::First, 8, 10),
                &observer(),
            )
            .expect("[08:00,10:00) books");

        let err = svc
            .scheduling
            .request_schedule(
                request("fac-202", CopusPass::First, Semester::First, 9, 11),
                &observer(),
            )
            .expect_err("[09:00,11:00) overlaps for the shared observer");
        assert!(matches!(err, SchedulingError::Conflict(_)));

        svc.scheduling
            .request_schedule(
                request("fac-202", CopusPass::First, Semester::First, 10, 12),
                &observer(),
            )
            .expect("[10:00,12:00) touches without overlapping");
    }

    #[test]
    fn second_pass_is_gated_until_the_first_completes() {
        let svc = services();

        let err = svc
            .scheduling
            .request_schedule(
                request("fac-101", CopusPass::Second, Semester::First, 8, 10),
                &observer(),
            )
            .expect_err("pass 2 before pass 1");
        match err {
            SchedulingError::Gate(GateError::PreviousPassIncomplete { required_pass }) => {
                assert_eq!(required_pass, CopusPass::First);
            }
            other => panic!("expected progression gate error, got {other:?}"),
        }
    }

    #[test]
    fn disapproved_schedules_free_their_slot() {
        let svc = services();

        let first = svc
            .scheduling
            .request_schedule(
                request("fac-101", CopusPass::First, Semester::First, 8, 10),
                &observer(),
            )
            .expect("books");
        let disapproved = svc
            .scheduling
            .disapprove(&first.id, &coordinator(), now())
            .expect("disapproved");
        assert_eq!(disapproved.status, ScheduleStatus::Disapproved);

        svc.scheduling
            .request_schedule(
                request("fac-202", CopusPass::First, Semester::First, 8, 10),
                &observer(),
            )
            .expect("the slot is free again");
    }
}

mod evaluation {
    use super::common::{
        active_learning_session, coordinator, engagement_only_session, now, observer, request,
        services,
    };
    use copus_tracker::workflows::observation::{
        CopusPass, PersonId, Rating, ScheduleStatus, Semester, SubmissionOutcome,
    };
    use copus_tracker::workflows::observation::repository::CompletionLedger;

    #[test]
    fn engagement_only_session_rates_unsatisfactory() {
        let svc = services();

        let schedule = svc
            .scheduling
            .request_schedule(
                request("fac-101", CopusPass::First, Semester::First, 8, 10),
                &observer(),
            )
            .expect("books");
        svc.scheduling
            .approve(&schedule.id, &coordinator(), now())
            .expect("approved");
        svc.scheduling
            .start(&schedule.id, &observer(), now())
            .expect("started");

        let outcome = svc
            .evaluation
            .submit_observation(
                &schedule.id,
                CopusPass::First,
                engagement_only_session(),
                &observer(),
                0,
                now(),
            )
            .expect("scored");

        let SubmissionOutcome::Completed { schedule, evaluation, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(schedule.status, ScheduleStatus::Completed);
        assert_eq!(evaluation.engagement_level_percentage, 61.0);
        assert_eq!(evaluation.overall_percentage, 20.0);
        assert_eq!(evaluation.rating, Rating::Unsatisfactory);
    }

    #[test]
    fn three_passes_progress_in_order_and_unlock_the_next_semester() {
        let svc = services();
        let faculty = "fac-101";

        for (pass, start_hour) in [
            (CopusPass::First, 8),
            (CopusPass::Second, 11),
            (CopusPass::Third, 14),
        ] {
            let schedule = svc
                .scheduling
                .request_schedule(
                    request(faculty, pass, Semester::First, start_hour, start_hour + 2),
                    &observer(),
                )
                .expect("gate admits the next pass");
            svc.scheduling
                .start(&schedule.id, &coordinator(), now())
                .expect("coordinator starts without approval");
            svc.evaluation
                .submit_observation(
                    &schedule.id,
                    pass,
                    active_learning_session(),
                    &observer(),
                    0,
                    now(),
                )
                .expect("scored");
        }

        let history = svc
            .completion
            .history_for(&PersonId(faculty.to_string()), "2025-2026")
            .expect("history");
        assert!(history.semester_complete(Semester::First));

        svc.scheduling
            .request_schedule(
                request(faculty, CopusPass::First, Semester::Second, 17, 19),
                &observer(),
            )
            .expect("a completed first semester unlocks the second");
    }

    #[test]
    fn active_learning_session_rates_great() {
        let svc = services();

        let schedule = svc
            .scheduling
            .request_schedule(
                request("fac-101", CopusPass::First, Semester::First, 8, 10),
                &observer(),
            )
            .expect("books");
        svc.scheduling
            .start(&schedule.id, &coordinator(), now())
            .expect("started");

        let outcome = svc
            .evaluation
            .submit_observation(
                &schedule.id,
                CopusPass::First,
                active_learning_session(),
                &observer(),
                0,
                now(),
            )
            .expect("scored");

        let SubmissionOutcome::Completed { evaluation, .. } = outcome else {
            panic!("expected completion");
        };
        // 7/10 student codes and 8/11 teacher codes in every interval, all
        // High engagement: round((70 + 73 + 100) / 3) = 81.
        assert_eq!(evaluation.student_action_percentage, 70.0);
        assert_eq!(evaluation.teacher_action_percentage, 73.0);
        assert_eq!(evaluation.engagement_level_percentage, 100.0);
        assert_eq!(evaluation.overall_percentage, 81.0);
        assert_eq!(evaluation.rating, Rating::Great);
    }
}

mod sheet_to_score {
    use super::common::{coordinator, now, observer, request, services};
    use copus_tracker::workflows::observation::{CopusPass, Rating, Semester, SubmissionOutcome};
    use copus_tracker::workflows::sheet::ObservationSheetImporter;
    use std::io::Cursor;

    fn sheet_csv() -> String {
        let mut csv = String::from("Interval,L,Grp,t:Lec,t:MG,High,Med,Low,Comments\n");
        for n in 1..=45u8 {
            // Alternate lecture-and-listen with guided group work.
            if n % 2 == 0 {
                csv.push_str(&format!("{n},,x,,x,x,,,\n"));
            } else {
                csv.push_str(&format!("{n},x,,x,,,x,,\n"));
            }
        }
        csv
    }

    #[test]
    fn an_imported_sheet_flows_through_submission() {
        let intervals =
            ObservationSheetImporter::from_reader(Cursor::new(sheet_csv())).expect("sheet parses");
        assert_eq!(intervals.len(), 45);

        let svc = services();
        let schedule = svc
            .scheduling
            .request_schedule(
                request("fac-101", CopusPass::First, Semester::First, 8, 10),
                &observer(),
            )
            .expect("books");
        svc.scheduling
            .start(&schedule.id, &coordinator(), now())
            .expect("started");

        let outcome = svc
            .evaluation
            .submit_observation(&schedule.id, CopusPass::First, intervals, &observer(), 0, now())
            .expect("scored");

        let SubmissionOutcome::Completed { evaluation, .. } = outcome else {
            panic!("expected completion");
        };
        // One action per side per interval; 22 High / 23 Medium intervals.
        assert_eq!(evaluation.student_action_percentage, 10.0);
        assert_eq!(evaluation.teacher_action_percentage, 9.0);
        assert_eq!(evaluation.engagement_level_percentage, 74.0);
        assert_eq!(evaluation.overall_percentage, 31.0);
        assert_eq!(evaluation.rating, Rating::NeedsImprovement);
    }
}
