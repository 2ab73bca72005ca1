//! Natural-language summary command

use food_quality_core::{error::Result, Scope};

use super::helpers::{open_service, GlobalOpts};

/// Handle summary / question command
pub async fn handle(
    question: Option<String>,
    scope: Option<Scope>,
    opts: &GlobalOpts,
) -> Result<()> {
    let (service, ctx) = open_service(opts).await?;

    let answer = service.ask(&ctx, scope, question.as_deref()).await;
    println!("{}", answer);
    Ok(())
}
