//! Pipeline forge: everything a stack needs to join the deployment pipeline.
//!
//! The three entry points of interest are:
//! - [`target::expand`] - the stage/account/region targets to create one stack for each
//! - [`stack_id::format_id`] - the id (and deployed name) of each stack
//! - [`guardrail::apply`] - the permission boundary and tags every stack must carry
//!
//! ```rust
//! use pipeline_forge::common::{environment, variables};
//! use pipeline_forge::construct::stack;
//! use pipeline_forge::forge::{config, guardrail, stack_id, target};
//!
//! let variables: variables::Variables = [
//!     ("CDK_DEFAULT_ACCOUNT", "123456789012"),
//!     ("CDK_DEFAULT_REGION", "us-east-1"),
//! ]
//! .into_iter()
//! .collect();
//! let guardrails = guardrail::GuardrailConfig {
//!     department: "fnds".to_string(),
//!     product: "accounts".to_string(),
//!     product_detail: "account service".to_string(),
//! };
//! for target in target::expand(&config::DeployConfig::new(variables)).unwrap() {
//!     let id = stack_id::format_id("svc", &target.stage, &target.environment, target.deployment.as_deref());
//!     let mut stack = stack::Stack::new(id, target.environment.clone()).unwrap();
//!     guardrail::apply(&mut stack, &target.stage, &guardrails).unwrap();
//!     assert_eq!(stack.id(), "svc-dev-123456789012-us-east-1");
//!     assert_eq!(stack.tag("Environment"), Some("Development"));
//! }
//! ```

/// Deployment variables read by the expander.
pub mod config;

/// Permission boundary and tag guardrails.
pub mod guardrail;

/// Stack id formatting.
pub mod stack_id;

/// Stage/account/region expansion.
pub mod target;
