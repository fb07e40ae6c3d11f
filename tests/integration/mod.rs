/// Integration tests running the engine over real SQLite files
mod engine_workflow;
mod habit_lifecycle;
