/// MCP server exposing complaint routing as tools.
///
/// - `classify_complaint`: classify free text and rank competent institutions
/// - `list_institutions`: list the current catalog
/// - `get_institution`: look up one institution by name
/// - `reload_catalog`: re-read the catalog file
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};

use complaint_common::api::{
    ClassifyComplaintParams, ComplaintRoutingResponse, GetInstitutionParams, InstitutionInfo,
    InstitutionListResponse, ReloadCatalogResponse,
};
use complaint_common::routing::ComplaintRouter;

#[derive(Clone)]
pub struct ComplaintMcpServer {
    router: Arc<ComplaintRouter>,
    tool_router: ToolRouter<ComplaintMcpServer>,
}

impl ComplaintMcpServer {
    pub fn new(router: Arc<ComplaintRouter>) -> Self {
        Self {
            router,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl ComplaintMcpServer {
    #[tool(description = "Classify a citizen complaint and return advice plus a ranked list of institutions competent to receive it.")]
    async fn classify_complaint(
        &self,
        Parameters(params): Parameters<ClassifyComplaintParams>,
    ) -> Result<Json<ComplaintRoutingResponse>, String> {
        let limit = params.limit.map(|n| n as usize);
        let response = self
            .router
            .route(&params.text, limit)
            .await
            .map_err(|e| format!("classification failed: {e}"))?;
        Ok(Json(response))
    }

    #[tool(description = "List every institution in the catalog with its tags and contact details.")]
    async fn list_institutions(&self) -> Result<Json<InstitutionListResponse>, String> {
        let catalog = self.router.catalog();
        let institutions: Vec<InstitutionInfo> =
            catalog.iter().map(InstitutionInfo::from).collect();
        Ok(Json(InstitutionListResponse {
            count: institutions.len(),
            institutions,
        }))
    }

    #[tool(description = "Get the tags and contact details of one institution by its exact name.")]
    async fn get_institution(
        &self,
        Parameters(params): Parameters<GetInstitutionParams>,
    ) -> Result<Json<InstitutionInfo>, String> {
        let name = params.name.trim();
        let catalog = self.router.catalog();
        catalog
            .get(name)
            .map(|inst| Json(InstitutionInfo::from(inst)))
            .ok_or_else(|| format!("institution not found: {name}"))
    }

    #[tool(description = "Reload the institution catalog from INSTITUTIONS_PATH. The previous catalog stays active if loading fails.")]
    async fn reload_catalog(&self) -> Result<Json<ReloadCatalogResponse>, String> {
        let router = Arc::clone(&self.router);
        let count = tokio::task::spawn_blocking(move || router.reload_catalog())
            .await
            .map_err(|e| format!("reload task failed: {e}"))?
            .map_err(|e| format!("reload failed: {e}"))?;
        Ok(Json(ReloadCatalogResponse {
            success: true,
            institutions: count,
        }))
    }
}

#[tool_handler]
impl ServerHandler for ComplaintMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "complaint-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Citizen complaint router. Call classify_complaint with the complaint text to get \
a classification, advice and ranked institutions. When no institution matches, the response \
carries fallback=true and a general ombudsman. Use list_institutions/get_institution to browse \
the catalog."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complaint_common::routing::RouterSettings;

    fn server() -> ComplaintMcpServer {
        let router = ComplaintRouter::load(RouterSettings::default()).unwrap();
        ComplaintMcpServer::new(Arc::new(router))
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = ComplaintMcpServer::tool_router().list_all();
        for name in [
            "classify_complaint",
            "list_institutions",
            "get_institution",
            "reload_catalog",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn classify_complaint_tool_routes_police_abuse() {
        let Json(response) = server()
            .classify_complaint(Parameters(ClassifyComplaintParams {
                text: "The police arrested me for no reason".to_string(),
                limit: Some(3),
            }))
            .await
            .unwrap();
        assert!(response.tags.contains(&"police".to_string()));
        assert!(response.institutions.len() <= 3);
        assert!(!response.fallback);
    }

    #[tokio::test]
    async fn classify_complaint_tool_rejects_blank_text() {
        let result = server()
            .classify_complaint(Parameters(ClassifyComplaintParams {
                text: " ".to_string(),
                limit: None,
            }))
            .await;
        let Err(err) = result else {
            panic!("blank text must be rejected");
        };
        assert!(err.contains("must not be empty"));
    }

    #[tokio::test]
    async fn get_institution_tool() {
        let server = server();
        let Json(info) = server
            .get_institution(Parameters(GetInstitutionParams {
                name: "Economic and Financial Crimes Commission (EFCC)".to_string(),
            }))
            .await
            .unwrap();
        assert!(info.tags.contains(&"fraud".to_string()));

        let result = server
            .get_institution(Parameters(GetInstitutionParams {
                name: "Ministry of Magic".to_string(),
            }))
            .await;
        let Err(err) = result else {
            panic!("unknown institution must be an error");
        };
        assert_eq!(err, "institution not found: Ministry of Magic");
    }
}
