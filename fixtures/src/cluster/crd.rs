use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{Api, ResourceExt};
use tracing::info;

use super::create_cluster_scoped;
use crate::{
    utils::{delete_and_wait, poll_until, Context},
    Result,
};

/// Report whether the API server serves the CRD.
pub fn is_crd_established(crd: &CustomResourceDefinition) -> bool {
    crd.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True")
        })
        .unwrap_or_default()
}

/// Create a CRD and wait until it is established.
#[tracing::instrument(skip_all, fields(name = %crd.name_any()))]
pub async fn create_crd_and_wait_until_established(
    cx: &Context,
    crd: &CustomResourceDefinition,
) -> Result<CustomResourceDefinition> {
    create_cluster_scoped(cx, crd).await?;
    let name = crd.name_any();
    let crds = &Api::<CustomResourceDefinition>::all(cx.k_client.clone());
    let name_ref = name.as_str();
    poll_until(cx.poll, &format!("crd {name} to be established"), || async move {
        Ok(is_crd_established(&crds.get(name_ref).await?))
    })
    .await?;
    info!(%name, "crd established");
    Ok(crds.get(&name).await?)
}

/// Delete a CRD and wait until it is gone.
#[tracing::instrument(skip(cx))]
pub async fn delete_crd_and_wait(cx: &Context, name: &str) -> Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(cx.k_client.clone());
    delete_and_wait(&crds, name, cx.poll).await
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
        CustomResourceDefinitionCondition, CustomResourceDefinitionStatus,
    };

    use super::*;
    use crate::{
        define::crd::{define_crd, CrdScope},
        utils::test::timeout_after_1s,
    };

    fn established(mut crd: CustomResourceDefinition) -> CustomResourceDefinition {
        crd.status = Some(CustomResourceDefinitionStatus {
            conditions: Some(vec![CustomResourceDefinitionCondition {
                type_: "Established".to_owned(),
                status: "True".to_owned(),
                ..Default::default()
            }]),
            ..Default::default()
        });
        crd
    }

    #[test]
    fn established_condition() {
        let crd = define_crd("test.certsuite.io", "Widget", "widgets", CrdScope::Namespaced, false);
        assert!(!is_crd_established(&crd));
        assert!(is_crd_established(&established(crd)));
    }

    #[tokio::test]
    async fn create_waits_for_established() {
        let (testctx, mut server) = Context::test();
        let mocksrv = tokio::spawn(async move {
            let (request, send) = server.next().await;
            assert_eq!(
                request.path,
                "/apis/apiextensions.k8s.io/v1/customresourcedefinitions"
            );
            assert_eq!(request.body["metadata"]["name"], "widgets.test.certsuite.io");
            send.echo(&request);

            let crd =
                define_crd("test.certsuite.io", "Widget", "widgets", CrdScope::Namespaced, true);
            let (_, send) = server.next().await;
            send.json(&crd);
            let (_, send) = server.next().await;
            send.json(&established(crd.clone()));
            let (_, send) = server.next().await;
            send.json(&established(crd));
        });
        let crd = define_crd("test.certsuite.io", "Widget", "widgets", CrdScope::Namespaced, true);
        let created = create_crd_and_wait_until_established(&testctx, &crd)
            .await
            .unwrap();
        assert!(is_crd_established(&created));
        timeout_after_1s(mocksrv).await;
    }
}
