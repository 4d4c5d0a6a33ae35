#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use autoapi::diagnostics::Severity;
use autoapi::generator::{Generation, MiddlewareAggregator, MiddlewareResolver, RouterGenerator};
use common::project::{three_handler_api, two_middleware, TestProject};
use common::reporting::recording;
use std::sync::Arc;

const THREE_HANDLER_ROUTER: &str = "import express from 'express';\n\
import index from '../api/index.js';\n\
import { handler as test_index } from '../api/test/index.js';\n\
import { handler as test_test } from '../api/test/test.js';\n\
\n\
const router = express.Router();\n\
router.get('/', index);\n\
router.put('/test', test_index);\n\
router.patch('/test/test', test_test);\n\
\n\
export default router;\n";

#[tokio::test]
async fn test_router_for_three_handler_tree() {
    let project = TestProject::new();
    three_handler_api(&project, "api");
    let (reporter, shared) = recording();
    let output = project.path("generated/api.ts");

    let outcome = RouterGenerator::new(shared)
        .generate(&project.path("api"), &output, &[], None)
        .await;

    assert_eq!(outcome, Generation::Succeeded);
    assert_eq!(project.read("generated/api.ts"), THREE_HANDLER_ROUTER);
    assert_eq!(
        reporter.messages(Severity::Info),
        vec![format!("generated endpoints: {}", output.display())]
    );
}

#[tokio::test]
async fn test_router_generation_is_idempotent() {
    let project = TestProject::new();
    three_handler_api(&project, "api");
    let (_reporter, shared) = recording();
    let generator = RouterGenerator::new(shared);
    let output = project.path("generated/api.ts");

    assert!(generator
        .generate(&project.path("api"), &output, &[], None)
        .await
        .is_success());
    let first = project.read("generated/api.ts");
    assert!(generator
        .generate(&project.path("api"), &output, &[], None)
        .await
        .is_success());

    assert_eq!(project.read("generated/api.ts"), first);
}

#[tokio::test]
async fn test_router_for_empty_folder_fails() {
    let project = TestProject::new();
    project.dir("api").file("api/notes.txt", "nothing here\n");
    let (reporter, shared) = recording();

    let outcome = RouterGenerator::new(shared)
        .generate(&project.path("api"), &project.path("generated/api.ts"), &[], None)
        .await;

    assert_eq!(outcome, Generation::Failed);
    assert!(!project.exists("generated/api.ts"));
    assert_eq!(
        reporter.messages(Severity::Error),
        vec![format!(
            "No endpoints found to map for {}",
            project.path("api").display()
        )]
    );
}

#[tokio::test]
async fn test_router_for_missing_folder_fails() {
    let project = TestProject::new();
    let (reporter, shared) = recording();

    let outcome = RouterGenerator::new(shared)
        .generate(&project.path("nope"), &project.path("generated/nope.ts"), &[], None)
        .await;

    assert_eq!(outcome, Generation::Failed);
    assert!(reporter.contains(Severity::Error, "No endpoints found to map for"));
}

#[tokio::test]
async fn test_router_with_folder_and_route_middleware() {
    let project = TestProject::new();
    two_middleware(&project, "middleware");
    project.file(
        "api/secure.ts",
        "export const config = { httpMethod: 'post', middleware: ['auth', 'ghost', 'logger'] };\n\
         export function handler(req, res) {\n  res.sendStatus(201);\n}\n",
    );
    let (reporter, shared) = recording();

    let mut aggregator = MiddlewareAggregator::new(
        project.path("middleware"),
        project.path("generated/middleware.ts"),
        Arc::clone(&shared),
    );
    assert!(aggregator.aggregate().await.is_success());

    let outcome = RouterGenerator::new(shared)
        .generate(
            &project.path("api"),
            &project.path("generated/api.ts"),
            &["logger".to_string(), "cors".to_string()],
            Some(&aggregator as &dyn MiddlewareResolver),
        )
        .await;

    assert_eq!(outcome, Generation::Succeeded);
    let expected = "import express from 'express';\n\
import { handler as secure } from '../api/secure.ts';\n\
import middleware from './middleware.ts';\n\
\n\
const router = express.Router();\n\
router.use(middleware['logger']);\n\
router.post('/secure', middleware['auth'], middleware['logger'], secure);\n\
\n\
export default router;\n";
    assert_eq!(project.read("generated/api.ts"), expected);
    assert!(reporter.messages(Severity::Error).is_empty());
}

#[tokio::test]
async fn test_router_without_resolver_drops_middleware() {
    let project = TestProject::new();
    project.file(
        "api/secure.ts",
        "export const config = { middleware: ['auth'] };\nexport function handler(req, res) {}\n",
    );
    let (_reporter, shared) = recording();

    let outcome = RouterGenerator::new(shared)
        .generate(
            &project.path("api"),
            &project.path("generated/api.ts"),
            &["auth".to_string()],
            None,
        )
        .await;

    assert!(outcome.is_success());
    let text = project.read("generated/api.ts");
    assert!(!text.contains("middleware"), "{text}");
    assert!(text.contains("router.get('/secure', secure);\n"));
}

#[tokio::test]
async fn test_middleware_table_and_available_subsequence() {
    let project = TestProject::new();
    two_middleware(&project, "middleware");
    let (reporter, shared) = recording();
    let output = project.path("generated/middleware.ts");

    let mut aggregator = MiddlewareAggregator::new(project.path("middleware"), &output, shared);
    assert_eq!(aggregator.aggregate().await, Generation::Succeeded);

    let expected = "import auth from '../middleware/auth.ts';\n\
import { middleware as logger } from '../middleware/logger.ts';\n\
\n\
const middleware = {\n\
\x20 'auth': auth,\n\
\x20 'logger': logger\n\
};\n\
\n\
export default middleware;\n";
    assert_eq!(project.read("generated/middleware.ts"), expected);
    assert_eq!(
        reporter.messages(Severity::Info),
        vec![format!("middleware aggregation created at {}", output.display())]
    );

    let requested: Vec<String> = ["logger", "missing", "auth", "logger"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        aggregator.get_available_middleware(&requested),
        vec!["logger".to_string(), "auth".to_string(), "logger".to_string()]
    );
}

#[tokio::test]
async fn test_middleware_missing_folder_fails() {
    let project = TestProject::new();
    let (reporter, shared) = recording();

    let mut aggregator = MiddlewareAggregator::new(
        project.path("middleware"),
        project.path("generated/middleware.ts"),
        shared,
    );

    assert_eq!(aggregator.aggregate().await, Generation::Failed);
    assert!(!project.exists("generated/middleware.ts"));
    assert!(reporter.contains(
        Severity::Error,
        &format!("No middleware found in folder: {}", project.path("middleware").display())
    ));
}

#[tokio::test]
async fn test_router_identifiers_avoid_keywords_and_module_locals() {
    let project = TestProject::new();
    for name in ["delete", "new", "router", "express"] {
        project.file(
            &format!("api/{name}.ts"),
            "export function handler(req, res) {}\n",
        );
    }
    let (_reporter, shared) = recording();

    let outcome = RouterGenerator::new(shared)
        .generate(&project.path("api"), &project.path("generated/api.ts"), &[], None)
        .await;

    assert_eq!(outcome, Generation::Succeeded);
    let expected = "import express from 'express';\n\
import { handler as _delete } from '../api/delete.ts';\n\
import { handler as express_1 } from '../api/express.ts';\n\
import { handler as _new } from '../api/new.ts';\n\
import { handler as router_1 } from '../api/router.ts';\n\
\n\
const router = express.Router();\n\
router.get('/delete', _delete);\n\
router.get('/express', express_1);\n\
router.get('/new', _new);\n\
router.get('/router', router_1);\n\
\n\
export default router;\n";
    assert_eq!(project.read("generated/api.ts"), expected);
}

#[tokio::test]
async fn test_middleware_file_named_middleware_keeps_table_binding() {
    let project = TestProject::new();
    project.file(
        "mw/middleware.ts",
        "export default function middleware(req, res, next) {\n  next();\n}\n",
    );
    let (_reporter, shared) = recording();

    let mut aggregator = MiddlewareAggregator::new(
        project.path("mw"),
        project.path("generated/middleware.ts"),
        shared,
    );
    assert!(aggregator.aggregate().await.is_success());

    let expected = "import middleware_1 from '../mw/middleware.ts';\n\
\n\
const middleware = {\n\
\x20 'middleware': middleware_1\n\
};\n\
\n\
export default middleware;\n";
    assert_eq!(project.read("generated/middleware.ts"), expected);
    assert_eq!(
        aggregator.get_available_middleware(&["middleware".to_string()]),
        vec!["middleware".to_string()]
    );
}
