// ==========================================
// 项目作业分组核心 - 小组提交 API
// ==========================================
// 职责: 组长代表全组提交；为每名当前成员写入一条提交记录
// 成功后小组状态置为 SUBMITTED；重复提交覆盖原记录
// ==========================================

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::access::{emit_system, load_group_context};
use crate::api::error::ApiResult;
use crate::api::validator::{require_id, validate_files, validate_labor_division};
use crate::domain::submission::{LaborDivisionEntry, Submission, SubmittedFile};
use crate::domain::types::GroupStatus;
use crate::engine::submission_gate::SubmissionGate;
use crate::repository::{GroupMemberRepository, GroupRepository, Store, SubmissionRepository};

// ==========================================
// SubmissionApi - 小组提交 API
// ==========================================
pub struct SubmissionApi {
    store: Store,
    gate: SubmissionGate,
}

impl SubmissionApi {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            gate: SubmissionGate::new(),
        }
    }

    /// 组长提交小组作业
    ///
    /// # 参数
    /// - assignment_id: 作业ID（必须与小组所属作业一致）
    /// - group_id: 小组ID
    /// - leader_id: 组长ID
    /// - files: 文件引用，非空
    /// - labor_division: 分工，每项 0..=100，不要求总和为 100
    ///
    /// # 返回
    /// - Ok(Vec<Submission>): 每名当前成员一条，按学生ID排序
    #[instrument(skip(self, files, labor_division), fields(file_count = files.len()))]
    pub fn submit(
        &self,
        assignment_id: &str,
        group_id: &str,
        leader_id: &str,
        files: Vec<SubmittedFile>,
        labor_division: Vec<LaborDivisionEntry>,
    ) -> ApiResult<Vec<Submission>> {
        require_id("作业ID", assignment_id)?;
        require_id("小组ID", group_id)?;
        require_id("组长ID", leader_id)?;
        validate_files(&files)?;
        validate_labor_division(&labor_division)?;
        let submissions = self.store.write(|tx| -> ApiResult<Vec<Submission>> {
            let at = Utc::now().naive_utc();
            let (group, assignment) = load_group_context(tx, group_id)?;
            let members = GroupMemberRepository::new(tx).find_by_group(group_id)?;
            self.gate.check(
                &group,
                &assignment.config,
                assignment_id,
                leader_id,
                members.len() as u32,
            )?;

            let submissions = SubmissionRepository::new(tx);
            for member in &members {
                submissions.upsert(&Submission {
                    submission_id: Uuid::new_v4().to_string(),
                    assignment_id: assignment_id.to_string(),
                    student_id: member.student_id.clone(),
                    group_id: group_id.to_string(),
                    files: files.clone(),
                    labor_division: labor_division.clone(),
                    submitted_by: leader_id.to_string(),
                    submitted_at: at,
                })?;
            }
            GroupRepository::new(tx).update_status(group_id, GroupStatus::Submitted)?;
            emit_system(tx, group_id, leader_id, format!("{} 提交了小组作业", leader_id), at)?;
            Ok(submissions.find_by_group(group_id)?)
        })?;

        info!(submissions = submissions.len(), "小组作业已提交");
        Ok(submissions)
    }

    /// 小组提交记录（按学生ID排序）
    pub fn list_group_submissions(&self, group_id: &str) -> ApiResult<Vec<Submission>> {
        require_id("小组ID", group_id)?;
        self.store.read(|conn| -> ApiResult<Vec<Submission>> {
            GroupRepository::new(conn).get(group_id)?;
            Ok(SubmissionRepository::new(conn).find_by_group(group_id)?)
        })
    }
}
