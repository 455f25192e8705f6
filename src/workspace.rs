// src/workspace.rs
//! Životní cyklus aplikace: přihlášení → nahrání dokumentu → viewer.
//!
//! Stav přihlášení i otevřený dokument žijí tady, ne v globálních proměnných;
//! front-end dostane `Workspace` při startu.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{UploadError, WorkspaceError};
use crate::extraction::{ExtractionResult, Extractor};
use crate::region::Region;
use crate::session::{DocumentSession, Effect};

/// Ve které fázi aplikace je.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Locked,
    Upload,
    Viewer,
}

#[derive(Debug, Default)]
pub struct Workspace {
    authenticated: bool,
    session: Option<DocumentSession>,
    source_path: Option<PathBuf>,
    edited_content: Vec<Region>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace s již otevřenou bránou (token z příkazové řádky / prostředí).
    pub fn with_token(token: Option<&str>) -> Self {
        let mut ws = Self::new();
        if let Some(token) = token {
            // prázdný token jen nechá workspace zamčený
            let _ = ws.authenticate(token);
        }
        ws
    }

    pub fn stage(&self) -> Stage {
        match (self.authenticated, &self.session) {
            (false, _) => Stage::Locked,
            (true, None) => Stage::Upload,
            (true, Some(_)) => Stage::Viewer,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Token se neověřuje; stačí, že existuje (ověření je věc externí služby).
    pub fn authenticate(&mut self, token: &str) -> Result<(), WorkspaceError> {
        if token.trim().is_empty() {
            return Err(WorkspaceError::EmptyToken);
        }
        self.authenticated = true;
        info!("authenticated");
        Ok(())
    }

    /// Odhlášení zahodí i otevřený dokument.
    pub fn logout(&mut self) {
        self.return_to_upload();
        self.authenticated = false;
        info!("logged out");
    }

    /// Otevře výsledek extrakce jako novou session (předchozí se zahodí).
    pub fn open(
        &mut self,
        result: ExtractionResult,
        source: Option<&Path>,
    ) -> Result<(), WorkspaceError> {
        if !self.authenticated {
            return Err(WorkspaceError::NotAuthenticated);
        }
        self.edited_content.clear();
        self.session = Some(DocumentSession::new(result));
        self.source_path = source.map(Path::to_path_buf);
        Ok(())
    }

    /// Spustí extrakci a výsledek otevře. Při chybě zůstává stav beze změny.
    pub fn upload(
        &mut self,
        extractor: &dyn Extractor,
        path: &Path,
    ) -> Result<(), UploadError> {
        if !self.authenticated {
            return Err(WorkspaceError::NotAuthenticated.into());
        }
        let result = extractor.extract(path)?;
        self.open(result, Some(path))?;
        Ok(())
    }

    /// Návrat k nahrávání: session i snapshot se zahodí.
    pub fn return_to_upload(&mut self) {
        if self.session.take().is_some() {
            info!("document session discarded");
        }
        self.source_path = None;
        self.edited_content.clear();
    }

    pub fn session(&self) -> Option<&DocumentSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut DocumentSession> {
        self.session.as_mut()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Poslední potvrzený snapshot (prázdný, dokud nic nebylo potvrzeno).
    pub fn edited_content(&self) -> &[Region] {
        &self.edited_content
    }

    /// Front-end volá po každém přechodu; commit obnoví snapshot.
    pub fn observe(&mut self, effects: &[Effect]) {
        let committed = effects
            .iter()
            .any(|e| matches!(e, Effect::ContentCommitted { .. }));
        if committed {
            if let Some(session) = &self.session {
                self.edited_content = session.snapshot();
            }
        }
    }
}
