pub mod support;

mod drivers;
mod jobs;
mod patterns;
mod routing;
