//! Personalized registration plan assembly.
//!
//! Text-plan generation for the consult endpoint: policy interpretation,
//! eligibility check, major matching, risk warning, plus the static
//! materials checklist and process steps. Policy facts come from the
//! knowledge store's policy section; an unavailable section degrades to
//! "not collected" text instead of failing the request.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use zhiyuan_knowledge::KnowledgeStore;

use crate::envelope::ApiEnvelope;
use crate::state::SharedState;

/// Interest tag to recommended majors. Mirrors the catalog's top picks.
const MAJOR_RECOMMENDATIONS: &[(&str, &[&str])] = &[
    (
        "理工",
        &[
            "计算机科学与技术",
            "人工智能",
            "电子信息工程",
            "机械设计制造及其自动化",
        ],
    ),
    ("文史", &["汉语言文学", "历史学", "哲学", "新闻传播学"]),
    ("经管", &["工商管理", "经济学", "金融学", "会计学"]),
    ("医学", &["临床医学", "口腔医学", "药学", "护理学"]),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultRequest {
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub user_info: serde_json::Map<String, Value>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// `POST /api/v1/gaokao/consult`
pub async fn consult_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ConsultRequest>,
) -> Response {
    if payload.province.trim().is_empty() {
        return ApiEnvelope::rejected("缺少必要参数：province").into_response();
    }

    info!(province = %payload.province, "Generating registration plan");
    let plan = generate_plan(
        &state.store,
        &payload.province,
        &payload.user_info,
        &payload.interests,
    )
    .await;

    ApiEnvelope::ok(serde_json::json!({
        "plan": plan,
        "provinceInfo": {
            "name": payload.province,
            "registrationDeadline": "请参考方案中的报名时间",
        }
    }))
    .into_response()
}

/// `GET /api/v1/gaokao/provinces`
pub async fn provinces_handler() -> Response {
    let provinces: Vec<_> = [
        ("北京", "北京市"),
        ("上海", "上海市"),
        ("广东", "广东省"),
        ("江苏", "江苏省"),
        ("浙江", "浙江省"),
    ]
    .iter()
    .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
    .collect();

    ApiEnvelope::ok(serde_json::json!({ "provinces": provinces })).into_response()
}

/// Assemble the whole plan text.
pub async fn generate_plan(
    store: &KnowledgeStore,
    province: &str,
    user_info: &serde_json::Map<String, Value>,
    interests: &[String],
) -> String {
    let policy = province_policy(store, province).await;

    let policy_text = interpret_policy(province, policy.as_ref());
    let eligibility = check_eligibility(province, policy.as_ref(), user_info);
    let majors = match_majors(interests);
    let risks = warn_risks(province, policy.as_ref(), user_info);

    format!(
        "《{province}高考个性化报名方案表》\n\
         ==========================\n\
         {policy_text}\n\n\
         资格判定:\n{eligibility}\n\n\
         志愿预匹配:{majors}\n\n\
         风险预警:{risks}\n\n\
         材料清单:\n\
         1. 身份证原件及复印件\n\
         2. 户口本原件及复印件\n\
         3. 学籍证明\n\
         4. 思想品德考核表\n\
         5. 体检报告\n\n\
         报名流程:\n\
         1. 网上报名\n\
         2. 现场确认\n\
         3. 缴费\n\
         4. 打印准考证\n\n\
         注意事项:\n\
         1. 请在报名截止日期前完成所有步骤\n\
         2. 确保所有材料真实有效\n\
         3. 关注官方通知，及时了解政策变化"
    )
}

/// Fetch this province's entry from the policy section, if available.
async fn province_policy(store: &KnowledgeStore, province: &str) -> Option<Value> {
    let policy = store.policy_data().await.ok()?;
    policy.get("provinces")?.get(province).cloned()
}

fn interpret_policy(province: &str, policy: Option<&Value>) -> String {
    let Some(policy) = policy else {
        return format!("暂未收录{province}的高考政策信息");
    };

    let subjects = policy
        .get("科目")
        .and_then(|s| s.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    format!(
        "{province}高考政策:\n报名时间: {}\n考试时间: {}\n考试科目: {}\n特殊要求: {}",
        text_field(policy, "报名时间"),
        text_field(policy, "考试时间"),
        subjects,
        text_field(policy, "特殊要求"),
    )
}

fn check_eligibility(
    province: &str,
    policy: Option<&Value>,
    user_info: &serde_json::Map<String, Value>,
) -> String {
    let Some(policy) = policy else {
        return format!("暂未收录{province}的高考政策信息");
    };

    if is_local(province, user_info) {
        format!("您符合{province}高考报名资格")
    } else {
        format!(
            "您不符合{province}高考报名资格，{}",
            text_field(policy, "特殊要求")
        )
    }
}

fn match_majors(interests: &[String]) -> String {
    let mut recommendations: Vec<&str> = Vec::new();
    for interest in interests {
        if let Some((_, majors)) = MAJOR_RECOMMENDATIONS
            .iter()
            .find(|(tag, _)| tag == interest)
        {
            recommendations.extend(majors.iter());
        }
    }
    recommendations.truncate(5);

    if recommendations.is_empty() {
        "\n暂无匹配专业，建议补充兴趣方向".into()
    } else {
        format!("\n根据您的兴趣，为您推荐以下专业:\n{}", recommendations.join("\n"))
    }
}

fn warn_risks(
    province: &str,
    policy: Option<&Value>,
    user_info: &serde_json::Map<String, Value>,
) -> String {
    let Some(policy) = policy else {
        return format!("暂未收录{province}的高考政策信息");
    };

    if is_local(province, user_info) {
        "\n暂无风险".into()
    } else {
        format!(
            "\n您可能不符合{province}高考报名资格，{}",
            text_field(policy, "特殊要求")
        )
    }
}

fn is_local(province: &str, user_info: &serde_json::Map<String, Value>) -> bool {
    ["province", "schoolProvince"]
        .iter()
        .any(|field| user_info.get(*field).and_then(|v| v.as_str()) == Some(province))
}

fn text_field<'a>(value: &'a Value, field: &str) -> &'a str {
    value.get(field).and_then(|v| v.as_str()).unwrap_or("未知")
}
