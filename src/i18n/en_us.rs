// ============================================================================
// Compox - English Translation Table
// ============================================================================
//
// 文件: src/i18n/en_us.rs
// 职责: English translation content definition
// 边界:
//   - ✅ English translation strings definition
//   - ❌ Should not contain translation logic
//   - ❌ Should not contain other language translations
//
// ============================================================================

/// English translation table
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // Analyze command
    ("analyze.title", "Cross-build dependency analysis"),
    ("analyze.root_build", "Root build: {}"),
    ("analyze.total_builds", "Builds: {}"),
    ("analyze.total_resolutions", "Resolutions: {}"),
    ("analyze.resolution_header", "Resolution '{}' (build {})"),
    ("analyze.no_cross_build", "No artifacts from other builds"),
    ("analyze.unknown_format", "Unknown output format '{}', use 'table' or 'json'"),
    (
        "analyze.usage_tip",
        "Use 'compox run -p <plan>' to build the artifacts listed above",
    ),
    ("analyze.cycles.details", "Builds depending on each other:"),
    ("analyze.cycles.cycle", "{}. {}"),
    (
        "analyze.cycles.suggestion",
        "Tasks whose builds wait on each other will fail with a cyclic dependency error",
    ),
    // Plan errors
    ("error.read_plan", "Failed to read composite plan: {}"),
    ("error.parse_plan", "Failed to parse composite plan: {}"),
    ("error.duplicate_build", "Build '{}' is defined more than once"),
    ("error.unknown_build", "Unknown build '{}'"),
    (
        "error.unknown_resolution",
        "Task '{}' resolves unknown resolution '{}'",
    ),
    (
        "error.foreign_resolution",
        "Task '{}' resolves '{}', which belongs to build '{}'",
    ),
    // Run command
    ("run.start", "Running composite build '{}' ({} builds)"),
    ("run.no_resolutions", "Build '{}' has no resolutions to run"),
    ("run.resolution_not_found", "Resolution '{}' not found"),
    ("run.resolution_done", "Resolution '{}' ready ({} files)"),
    ("run.resolution_failed", "Resolution '{}' failed: {}"),
    ("run.resolution_cancelled", "Resolution '{}' was cancelled"),
    ("run.files", "Resolved files:"),
    ("run.success", "Composite build finished"),
    ("run.failed", "Composite build failed"),
    // Command runner
    ("runner.command_run", "[{}] $ {}"),
    ("runner.command_stdout", "{}"),
    ("runner.command_stderr", "{}"),
    ("runner.command_spawn_failed", "Failed to start '{}': {}"),
    ("runner.command_failed", "'{}' exited with code {}"),
    ("runner.unknown_task", "Task '{}' is not defined in the plan"),
    ("runner.unknown_resolution", "Resolution '{}' is not defined in the plan"),
    ("runner.resolution_failed", "Resolving '{}' failed: {}"),
    (
        "runner.foreign_resolution",
        "Resolution '{}' belongs to build '{}' and cannot be resolved by '{}'",
    ),
    // Build worker
    ("worker.task_start", "Starting {}:{}"),
    ("worker.task_success", "Finished {}:{} in {}s"),
    ("worker.task_failed", "Failed {}:{} after {}s: {}"),
    ("worker.task_timeout", "Task timed out after {}s"),
    ("worker.task_join_error", "Task of build '{}' panicked: {}"),
    ("worker.join_error", "Build executor panicked: {}"),
    // Execution summary
    ("summary.title", "Execution summary"),
    ("summary.requested_tasks", "Requested tasks: {}"),
    ("summary.executed_tasks", "Executed tasks: {}"),
    ("summary.completed_tasks", "Completed: {}"),
    ("summary.failed_tasks", "Failed: {}"),
    ("summary.pending_tasks", "Not finished: {}"),
    ("summary.duration", "Duration: {}s"),
    ("summary.failures", "Failed tasks:"),
];
