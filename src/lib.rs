pub mod animation;
pub mod assets;
pub mod basic_scene;
pub mod camera;
pub mod config;
pub mod demo;
pub mod docs;
pub mod engine;
pub mod lighting;
pub mod math;
pub mod model;
pub mod orbit_controls;
pub mod rendering;
pub mod scene_graph;
pub mod viewer;
pub mod window;
