#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod project {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A throwaway project root that handler trees are written into
    pub struct TestProject {
        dir: TempDir,
    }

    impl TestProject {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().expect("create temp project"),
            }
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn path(&self, relative: &str) -> PathBuf {
            self.root().join(relative)
        }

        /// Write `contents` to `relative`, creating parent directories
        pub fn file(&self, relative: &str, contents: &str) -> &Self {
            let path = self.path(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
            self
        }

        pub fn dir(&self, relative: &str) -> &Self {
            fs::create_dir_all(self.path(relative)).unwrap();
            self
        }

        pub fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.path(relative))
                .unwrap_or_else(|e| panic!("read {relative}: {e}"))
        }

        pub fn exists(&self, relative: &str) -> bool {
            self.path(relative).exists()
        }
    }

    /// `index.js` (GET), `test/index.js` (PUT) and `test/test.js` (PATCH)
    pub fn three_handler_api(project: &TestProject, folder: &str) {
        project
            .file(
                &format!("{folder}/index.js"),
                "export default function handler(req, res) {\n  res.send('root');\n}\n",
            )
            .file(
                &format!("{folder}/test/index.js"),
                "export const config = { httpMethod: 'PUT' };\n\
                 export function handler(req, res) {\n  res.send('put');\n}\n",
            )
            .file(
                &format!("{folder}/test/test.js"),
                "export const config = { httpMethod: HttpMethod.PATCH, middleware: ['testLogger'] };\n\
                 export const handler = async (req, res) => {\n  res.send('patch');\n};\n",
            );
    }

    /// `auth.ts` (default export) and `logger.ts` (named export)
    pub fn two_middleware(project: &TestProject, folder: &str) {
        project
            .file(
                &format!("{folder}/auth.ts"),
                "export default function middleware(req, res, next) {\n  next();\n}\n",
            )
            .file(
                &format!("{folder}/logger.ts"),
                "export function middleware(req, res, next) {\n  console.log(req.path);\n  next();\n}\n",
            );
    }
}

pub mod reporting {
    use autoapi::diagnostics::{RecordingReporter, SharedReporter};
    use std::sync::Arc;

    /// A recording reporter plus the shared handle the pipeline takes
    pub fn recording() -> (Arc<RecordingReporter>, SharedReporter) {
        let reporter = Arc::new(RecordingReporter::new());
        let shared: SharedReporter = Arc::clone(&reporter) as SharedReporter;
        (reporter, shared)
    }
}
