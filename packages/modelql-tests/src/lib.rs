pub mod fixtures;
pub mod todo;

pub const WORKSPACE_ROOT: &str = env!("CARGO_MANIFEST_DIR");

pub mod defaults {
    pub const VIEWER_ID: &str = "me";
    pub const SEED_TODOS: [(&str, bool); 3] = [
        ("Hello Todo", false),
        ("Eat dinner", true),
        ("Sleep tight", false),
    ];
}
