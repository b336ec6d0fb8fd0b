#![deny(missing_docs)]

//! # Pipeline Forge
//!
//! Deployment pipeline plumbing for serverless CRUD services on AWS.
//!
//! ## Overview
//!
//! Every generated service is deployed as one CloudFormation stack per stage, account and
//! region. This library:
//! - Expands `CDK_DEPLOY_*` variables into the ordered list of deployment targets
//! - Names each stack `project-stage-account-region[-deployment]`
//! - Enforces organizational guardrails: a deploy-time permission boundary on every role,
//!   and Department / Environment / Product / ProductDetail tags
//! - Declares the CRUD service itself (table, HTTP API, functions) and synthesizes templates
//!
//! ## Quick Example
//!
//! ```rust
//! use pipeline_forge::{app, common::variables, forge::{config, guardrail}, service};
//!
//! let deploy = config::DeployConfig::new(
//!     variables::Variables::default()
//!         .with("CDK_DEPLOY_STAGES", "dev prod")
//!         .with("CDK_DEPLOY_prod_ACCOUNTS", "111111111111 222222222222")
//!         .with("CDK_DEFAULT_ACCOUNT", "000000000000")
//!         .with("CDK_DEFAULT_REGION", "us-east-1"),
//! );
//! let project = app::ProjectConfig {
//!     project_name: "acct".to_string(),
//!     service: service::ServiceProps { api_domain: "acct".to_string() },
//!     guardrails: guardrail::GuardrailConfig {
//!         department: "fnds".to_string(),
//!         product: "accounts".to_string(),
//!         product_detail: "account service".to_string(),
//!     },
//! };
//! let stacks = app::build(&project, &deploy).unwrap();
//! assert_eq!(stacks.len(), 3);
//! assert_eq!(stacks[2].id(), "acct-prod-222222222222-us-east-1");
//! assert_eq!(stacks[2].tag("Environment"), Some("Production"));
//!
//! let templates = app::synth(&stacks).unwrap();
//! assert!(templates["acct-dev-000000000000-us-east-1"].declares("BoundaryPolicyArn"));
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Environment, errors and configuration variables
//! - [`mod@construct`] - Construct tree, resources and template synthesis
//! - [`mod@forge`] - Target expansion, stack ids and guardrails
//! - [`mod@service`] - The CRUD service stack and its function handlers
//! - [`mod@app`] - Driver tying the above together

/// App driver building and synthesizing every stack.
pub mod app;

/// Shared environment, error and configuration types.
pub mod common;

/// Construct tree and template synthesis.
///
/// This module provides:
/// - Groups, parameters, resources and outputs organized in a tree
/// - A visitor to walk and modify the tree
/// - Synthesis into a CloudFormation template with tags and reference checks
pub mod construct;

/// Deployment pipeline helpers.
pub mod forge;

/// The serverless CRUD service.
pub mod service;
