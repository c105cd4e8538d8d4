use schedule_engine::{
    Dependency, DependencyKind, Project, ProjectMetadata, ScheduleDag, ScheduleEngine,
    ScheduleError, Task,
};

fn project(tasks: Vec<Task>, deps: Vec<Dependency>) -> Project {
    Project::from_records(ProjectMetadata::default(), tasks, deps, Vec::new(), Vec::new())
        .expect("valid records")
}

#[test]
fn topological_order_breaks_ties_by_id() {
    let tasks = vec![
        Task::new(5, "E", 1),
        Task::new(3, "C", 1),
        Task::new(1, "A", 1),
        Task::new(4, "D", 1),
        Task::new(2, "B", 1),
    ];
    let deps = vec![
        Dependency::finish_to_start(3, 2),
        Dependency::finish_to_start(1, 4),
    ];
    let dag = ScheduleDag::from_records(&tasks, &deps).unwrap();
    assert_eq!(dag.topological_order(), &[1, 3, 2, 4, 5]);
    assert_eq!(dag.task_count(), 5);
    assert_eq!(dag.dependency_count(), 2);
}

#[test]
fn adjacency_is_available_in_both_directions() {
    let tasks = vec![Task::new(1, "A", 2), Task::new(2, "B", 3), Task::new(3, "C", 1)];
    let deps = vec![
        Dependency::finish_to_start(1, 3),
        Dependency::new(2, 3, DependencyKind::StartToStart, 1),
    ];
    let dag = ScheduleDag::from_records(&tasks, &deps).unwrap();

    let preds: Vec<_> = dag.predecessors(3).into_iter().map(|(id, _)| id).collect();
    assert_eq!(preds, vec![1, 2]);
    let succs = dag.successors(2);
    assert_eq!(succs.len(), 1);
    assert_eq!(succs[0].0, 3);
    assert_eq!(succs[0].1.kind, DependencyKind::StartToStart);
    assert_eq!(succs[0].1.lag, 1);
    assert_eq!(dag.duration(2), 3);
}

#[test]
fn unknown_task_reference_is_rejected() {
    let tasks = vec![Task::new(1, "A", 2)];
    let deps = vec![Dependency::finish_to_start(1, 9)];
    match ScheduleDag::from_records(&tasks, &deps) {
        Err(ScheduleError::UnknownTaskReference { missing, .. }) => assert_eq!(missing, 9),
        other => panic!("expected UnknownTaskReference, got {other:?}"),
    }
}

#[test]
fn self_dependency_is_rejected() {
    let tasks = vec![Task::new(1, "A", 2)];
    let deps = vec![Dependency::finish_to_start(1, 1)];
    assert!(matches!(
        ScheduleDag::from_records(&tasks, &deps),
        Err(ScheduleError::InvalidDependency { predecessor: 1, successor: 1, .. })
    ));
}

#[test]
fn cycle_is_reported_from_smallest_id() {
    let tasks = vec![
        Task::new(1, "A", 1),
        Task::new(2, "B", 1),
        Task::new(3, "C", 1),
        Task::new(4, "D", 1),
    ];
    let deps = vec![
        Dependency::finish_to_start(4, 1),
        Dependency::finish_to_start(3, 2),
        Dependency::finish_to_start(2, 3),
        Dependency::finish_to_start(1, 2),
    ];
    match ScheduleDag::from_records(&tasks, &deps) {
        Err(ScheduleError::CyclicDependency { cycle }) => assert_eq!(cycle, vec![2, 3]),
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}

#[test]
fn three_task_cycle_fails_before_any_dates_are_computed() {
    let mut project = project(
        vec![Task::new(1, "A", 2), Task::new(2, "B", 2), Task::new(3, "C", 2)],
        vec![
            Dependency::finish_to_start(1, 2),
            Dependency::finish_to_start(2, 3),
            Dependency::finish_to_start(3, 1),
        ],
    );
    let err = ScheduleEngine::default()
        .compute_critical_path(&mut project)
        .unwrap_err();
    match &err {
        ScheduleError::CyclicDependency { cycle } => assert_eq!(cycle, &vec![1, 2, 3]),
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
    assert_eq!(err.to_string(), "cyclic dependency: 1 -> 2 -> 3 -> 1");
    assert!(project.schedule().is_none());
}

#[test]
fn duplicate_task_ids_are_rejected() {
    let result = Project::from_records(
        ProjectMetadata::default(),
        vec![Task::new(1, "A", 1), Task::new(1, "A again", 2)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );
    assert!(matches!(result, Err(ScheduleError::DuplicateTask(1))));
}
