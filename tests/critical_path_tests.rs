use schedule_engine::{
    ComputedSchedule, Dependency, DependencyKind, EngineConfig, Project, ProjectMetadata,
    ScheduleEngine, ScheduleError, Task, TaskSchedule,
};

fn compute(tasks: Vec<Task>, deps: Vec<Dependency>) -> ComputedSchedule {
    let mut project =
        Project::from_records(ProjectMetadata::default(), tasks, deps, Vec::new(), Vec::new())
            .expect("valid records");
    let schedule = ScheduleEngine::default()
        .compute_critical_path(&mut project)
        .expect("schedule");
    (*schedule).clone()
}

fn dates(schedule: &ComputedSchedule, id: i32) -> (i64, i64, i64, i64) {
    let t: &TaskSchedule = schedule.task(id).expect("task scheduled");
    (t.early_start, t.early_finish, t.late_start, t.late_finish)
}

#[test]
fn branching_example_has_single_critical_branch() {
    let schedule = compute(
        vec![Task::new(1, "A", 3), Task::new(2, "B", 2), Task::new(3, "C", 4)],
        vec![Dependency::finish_to_start(1, 2), Dependency::finish_to_start(1, 3)],
    );

    assert_eq!(dates(&schedule, 1), (0, 3, 0, 3));
    assert_eq!(dates(&schedule, 2), (3, 5, 5, 7));
    assert_eq!(dates(&schedule, 3), (3, 7, 3, 7));
    assert_eq!(schedule.task(2).unwrap().total_float, 2);
    assert_eq!(schedule.task(2).unwrap().free_float, 2);
    assert_eq!(schedule.task(3).unwrap().total_float, 0);
    assert_eq!(schedule.critical_path(), &[1, 3]);
    assert_eq!(schedule.critical_chains(), &[vec![1, 3]]);
    assert_eq!(schedule.project_duration(), 7);
}

#[test]
fn lag_delays_the_successor() {
    let schedule = compute(
        vec![Task::new(1, "A", 2), Task::new(2, "B", 4)],
        vec![Dependency::new(1, 2, DependencyKind::FinishToStart, 3)],
    );
    assert_eq!(dates(&schedule, 2), (5, 9, 5, 9));
    assert_eq!(schedule.project_finish(), 9);
    assert_eq!(schedule.task(1).unwrap().total_float, 0);
    assert_eq!(schedule.task(2).unwrap().binding_predecessor, Some(1));
}

#[test]
fn negative_lag_is_a_lead_but_never_before_project_start() {
    let schedule = compute(
        vec![Task::new(1, "A", 4), Task::new(2, "B", 2), Task::new(3, "C", 1)],
        vec![
            Dependency::new(1, 2, DependencyKind::FinishToStart, -1),
            Dependency::new(3, 2, DependencyKind::StartToStart, -5),
        ],
    );
    assert_eq!(dates(&schedule, 2).0, 3);
    assert_eq!(schedule.task(2).unwrap().binding_predecessor, Some(1));
    assert_eq!(schedule.project_finish(), 5);
}

#[test]
fn parallel_critical_paths_are_listed_separately() {
    let schedule = compute(
        vec![
            Task::new(1, "A", 3),
            Task::new(2, "B", 2),
            Task::new(3, "C", 2),
            Task::new(4, "D", 3),
        ],
        vec![Dependency::finish_to_start(1, 2), Dependency::finish_to_start(3, 4)],
    );
    assert_eq!(schedule.project_finish(), 5);
    assert_eq!(schedule.critical_path(), &[1, 2, 3, 4]);
    assert_eq!(schedule.critical_chains(), &[vec![1, 2], vec![3, 4]]);
}

#[test]
fn start_to_start_successor_keeps_float_inside_project() {
    let schedule = compute(
        vec![Task::new(1, "A", 5), Task::new(2, "B", 2)],
        vec![Dependency::new(1, 2, DependencyKind::StartToStart, 1)],
    );
    assert_eq!(dates(&schedule, 2), (1, 3, 3, 5));
    // A may not finish past the project end even though B would allow it
    assert_eq!(dates(&schedule, 1), (0, 5, 0, 5));
    assert_eq!(schedule.critical_path(), &[1]);
}

#[test]
fn finish_to_finish_links_finishes() {
    let schedule = compute(
        vec![Task::new(1, "A", 3), Task::new(2, "B", 2)],
        vec![Dependency::new(1, 2, DependencyKind::FinishToFinish, 1)],
    );
    assert_eq!(dates(&schedule, 2), (2, 4, 2, 4));
    assert_eq!(dates(&schedule, 1), (0, 3, 0, 3));
    assert_eq!(schedule.critical_chains(), &[vec![1, 2]]);
}

#[test]
fn start_to_finish_links_start_to_finish() {
    let schedule = compute(
        vec![Task::new(1, "A", 2), Task::new(2, "B", 3)],
        vec![Dependency::new(1, 2, DependencyKind::StartToFinish, 4)],
    );
    assert_eq!(dates(&schedule, 2), (1, 4, 1, 4));
    assert_eq!(dates(&schedule, 1), (0, 2, 0, 2));
    assert_eq!(schedule.project_finish(), 4);
}

#[test]
fn free_float_measures_slack_to_the_earliest_successor() {
    let schedule = compute(
        vec![Task::new(1, "A", 2), Task::new(2, "B", 4), Task::new(3, "C", 1)],
        vec![Dependency::finish_to_start(1, 3), Dependency::finish_to_start(2, 3)],
    );
    let a = schedule.task(1).unwrap();
    assert_eq!(a.free_float, 2);
    assert_eq!(a.total_float, 2);
    assert_eq!(schedule.task(3).unwrap().binding_predecessor, Some(2));
}

#[test]
fn earliest_start_constraint_and_project_start_are_respected() {
    let mut metadata = ProjectMetadata::new("p", "Constrained");
    metadata.start_period = 10;
    let mut project = Project::from_records(
        metadata,
        vec![Task::new(1, "A", 2), Task::new(2, "B", 1).with_earliest_start(15)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();
    let schedule = ScheduleEngine::default()
        .compute_critical_path(&mut project)
        .unwrap();
    assert_eq!(schedule.project_start(), 10);
    assert_eq!(dates(&schedule, 1), (10, 12, 14, 16));
    assert_eq!(dates(&schedule, 2), (15, 16, 15, 16));
    assert_eq!(schedule.project_duration(), 6);
}

#[test]
fn milestones_have_zero_length() {
    let schedule = compute(
        vec![Task::new(1, "A", 3), Task::new(2, "Done", 0)],
        vec![Dependency::finish_to_start(1, 2)],
    );
    assert_eq!(dates(&schedule, 2), (3, 3, 3, 3));
    assert!(schedule.task(2).unwrap().is_critical);
}

#[test]
fn float_is_never_negative_and_critical_means_zero_float() {
    let schedule = compute(
        vec![
            Task::new(1, "A", 4),
            Task::new(2, "B", 1),
            Task::new(3, "C", 6),
            Task::new(4, "D", 2),
            Task::new(5, "E", 3),
        ],
        vec![
            Dependency::finish_to_start(1, 2),
            Dependency::new(1, 3, DependencyKind::StartToStart, 2),
            Dependency::new(2, 4, DependencyKind::FinishToFinish, 0),
            Dependency::finish_to_start(3, 5),
            Dependency::new(4, 5, DependencyKind::StartToFinish, 1),
        ],
    );
    for task in schedule.tasks() {
        assert!(task.total_float >= 0, "task {} has negative float", task.task_id);
        assert!(task.free_float <= task.total_float);
        assert_eq!(task.is_critical, task.total_float == 0);
        assert_eq!(task.early_finish - task.early_start, task.duration);
        assert_eq!(task.late_finish - task.late_start, task.duration);
    }
}

#[test]
fn recomputation_is_deterministic() {
    let build = || {
        compute(
            vec![
                Task::new(3, "C", 2),
                Task::new(1, "A", 2),
                Task::new(2, "B", 2),
            ],
            vec![Dependency::finish_to_start(1, 3), Dependency::finish_to_start(2, 3)],
        )
    };
    assert_eq!(build(), build());
    assert_eq!(build().critical_chains(), &[vec![1, 3], vec![2, 3]]);
}

#[test]
fn negative_duration_is_infeasible() {
    let mut project = Project::from_records(
        ProjectMetadata::default(),
        vec![Task::new(1, "A", -2)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();
    assert!(matches!(
        ScheduleEngine::default().compute_critical_path(&mut project),
        Err(ScheduleError::InfeasibleSchedule { task_id: 1, .. })
    ));
}

#[test]
fn chain_enumeration_is_capped() {
    // Four independent critical tasks produce four single-task chains
    let mut project = Project::from_records(
        ProjectMetadata::default(),
        (1..=4).map(|id| Task::new(id, "T", 2)).collect(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();
    let engine = ScheduleEngine::new(EngineConfig {
        max_critical_chains: 2,
        ..EngineConfig::default()
    });
    let schedule = engine.compute_critical_path(&mut project).unwrap();
    assert_eq!(schedule.critical_chains().len(), 2);
    assert_eq!(schedule.critical_path().len(), 4);
}

#[test]
fn computed_schedule_is_stored_and_dropped_on_change() {
    let mut project = Project::from_records(
        ProjectMetadata::default(),
        vec![Task::new(1, "A", 2)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();
    ScheduleEngine::default().compute_critical_path(&mut project).unwrap();
    assert!(project.schedule().is_some());
    project.upsert_task(Task::new(1, "A", 5));
    assert!(project.schedule().is_none());
}

#[test]
fn portfolio_computes_each_project() {
    let ok = Project::from_records(
        ProjectMetadata::new("ok", "OK"),
        vec![Task::new(1, "A", 2)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();
    let cyclic = Project::from_records(
        ProjectMetadata::new("bad", "Bad"),
        vec![Task::new(1, "A", 1), Task::new(2, "B", 1)],
        vec![Dependency::finish_to_start(1, 2), Dependency::finish_to_start(2, 1)],
        Vec::new(),
        Vec::new(),
    )
    .unwrap();
    let mut projects = vec![ok, cyclic];
    let results = ScheduleEngine::default().compute_portfolio(&mut projects);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().project_finish(), 2);
    assert!(matches!(results[1], Err(ScheduleError::CyclicDependency { .. })));
    assert!(projects[0].schedule().is_some());
    assert!(projects[1].schedule().is_none());
}

#[test]
fn lags_along_a_chain_add_to_the_duration() {
    let schedule = compute(
        vec![Task::new(1, "A", 2), Task::new(2, "B", 3), Task::new(3, "C", 4)],
        vec![
            Dependency::new(1, 2, DependencyKind::FinishToStart, 1),
            Dependency::new(2, 3, DependencyKind::FinishToStart, 2),
        ],
    );
    assert_eq!(dates(&schedule, 1), (0, 2, 0, 2));
    assert_eq!(dates(&schedule, 2), (3, 6, 3, 6));
    assert_eq!(dates(&schedule, 3), (8, 12, 8, 12));
    // 2 + 3 + 4 working plus 1 + 2 lag
    assert_eq!(schedule.project_duration(), 12);
    for id in 1..=3 {
        let task = schedule.task(id).unwrap();
        assert_eq!((task.total_float, task.free_float), (0, 0), "task {id}");
        assert!(task.is_critical);
    }
    assert_eq!(schedule.critical_path(), &[1, 2, 3]);
    assert_eq!(schedule.critical_chains(), &[vec![1, 2, 3]]);
}

#[test]
fn shorter_branch_into_a_merge_floats_by_the_difference() {
    let schedule = compute(
        vec![
            Task::new(1, "A", 2),
            Task::new(2, "B", 2),
            Task::new(3, "C", 1),
            Task::new(4, "D", 1),
        ],
        vec![
            Dependency::finish_to_start(1, 2),
            Dependency::finish_to_start(2, 4),
            Dependency::finish_to_start(3, 4),
        ],
    );
    assert_eq!(dates(&schedule, 3), (0, 1, 3, 4));
    let short = schedule.task(3).unwrap();
    assert_eq!(short.total_float, 3);
    assert_eq!(short.free_float, 3);
    assert!(!short.is_critical);
    assert_eq!(dates(&schedule, 4), (4, 5, 4, 5));
    assert_eq!(schedule.task(4).unwrap().binding_predecessor, Some(2));
    assert_eq!(schedule.critical_path(), &[1, 2, 4]);
    assert_eq!(schedule.critical_chains(), &[vec![1, 2, 4]]);
    assert_eq!(schedule.project_duration(), 5);
}
