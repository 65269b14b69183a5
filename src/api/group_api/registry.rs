// ==========================================
// GroupApi - 创建与查询
// ==========================================

use super::*;

impl GroupApi {
    /// 学生创建小组，创建者成为组长
    ///
    /// # 参数
    /// - assignment_id: 作业ID（必须是分组类型）
    /// - creator_id: 创建者学生ID
    /// - name: 小组名称（1..=50 字符）
    ///
    /// # 返回
    /// - Ok(GroupDetail): 新小组详情，status = FORMING，成员仅创建者
    /// - Err(ApiError): NotGroupType / NotInClass / DeadlinePassed / AlreadyGrouped
    #[instrument(skip(self, name))]
    pub fn create_group(
        &self,
        assignment_id: &str,
        creator_id: &str,
        name: &str,
    ) -> ApiResult<GroupDetail> {
        require_id("作业ID", assignment_id)?;
        require_id("学生ID", creator_id)?;
        let name = normalize_group_name(name)?;
        let settings = self.settings()?;
        let detail = self.store.write(|tx| -> ApiResult<GroupDetail> {
            let now = Utc::now();
            let assignment = AssignmentRepository::new(tx).get(assignment_id)?;
            self.rules.ensure_group_assignment(&assignment)?;
            ensure_enrolled(tx, &assignment, creator_id)?;
            self.rules.ensure_deadline_open(&assignment.config, now)?;
            let existing =
                GroupMemberRepository::new(tx).find_for_student(assignment_id, creator_id)?;
            self.rules.ensure_not_grouped(creator_id, existing.as_ref())?;

            let at = now.naive_utc();
            let group = self.insert_group_with_unique_code(
                tx,
                assignment_id,
                &name,
                creator_id,
                at,
                settings.invite_code_max_attempts,
            )?;
            add_member(tx, &group, creator_id, MemberRole::Leader, at)?;
            emit_system(
                tx,
                &group.group_id,
                creator_id,
                format!("{} 创建了小组「{}」", creator_id, group.name),
                at,
            )?;
            load_detail(tx, group, &assignment.config)
        })?;

        info!(
            group_id = %detail.group.group_id,
            invite_code = %detail.group.invite_code,
            "小组已创建"
        );
        Ok(detail)
    }

    /// 作业所属班级中尚未加入任何小组的学生（花名册顺序）
    pub fn get_unassigned(&self, assignment_id: &str) -> ApiResult<Vec<RosterEntry>> {
        require_id("作业ID", assignment_id)?;
        self.store.read(|conn| -> ApiResult<Vec<RosterEntry>> {
            let assignment = AssignmentRepository::new(conn).get(assignment_id)?;
            unassigned_roster(conn, &assignment.assignment_id, &assignment.class_id)
        })
    }

    /// 小组当前人数与上限
    pub fn capacity_of(&self, group_id: &str) -> ApiResult<Capacity> {
        require_id("小组ID", group_id)?;
        self.store.read(|conn| -> ApiResult<Capacity> {
            let (group, assignment) = load_group_context(conn, group_id)?;
            let count = GroupMemberRepository::new(conn).count_by_group(&group.group_id)?;
            Ok(Capacity {
                count,
                max: assignment.config.max_size,
            })
        })
    }

    /// 小组详情（成员按加入顺序）
    pub fn get_group_detail(&self, group_id: &str) -> ApiResult<GroupDetail> {
        require_id("小组ID", group_id)?;
        self.store.read(|conn| -> ApiResult<GroupDetail> {
            let (group, assignment) = load_group_context(conn, group_id)?;
            load_detail(conn, group, &assignment.config)
        })
    }

    /// 作业下所有小组（按创建顺序）
    pub fn list_groups(&self, assignment_id: &str) -> ApiResult<Vec<GroupDetail>> {
        require_id("作业ID", assignment_id)?;
        self.store.read(|conn| -> ApiResult<Vec<GroupDetail>> {
            let assignment = AssignmentRepository::new(conn).get(assignment_id)?;
            GroupRepository::new(conn)
                .find_by_assignment(assignment_id)?
                .into_iter()
                .map(|group| load_detail(conn, group, &assignment.config))
                .collect()
        })
    }

    /// 学生在作业下所属小组
    pub fn find_my_group(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> ApiResult<Option<GroupDetail>> {
        require_id("作业ID", assignment_id)?;
        require_id("学生ID", student_id)?;
        self.store.read(|conn| -> ApiResult<Option<GroupDetail>> {
            let member =
                GroupMemberRepository::new(conn).find_for_student(assignment_id, student_id)?;
            match member {
                Some(member) => {
                    let (group, assignment) = load_group_context(conn, &member.group_id)?;
                    Ok(Some(load_detail(conn, group, &assignment.config)?))
                }
                None => Ok(None),
            }
        })
    }
}

/// 花名册中未分组的学生
pub(super) fn unassigned_roster(
    conn: &Connection,
    assignment_id: &str,
    class_id: &str,
) -> ApiResult<Vec<RosterEntry>> {
    let grouped = GroupMemberRepository::new(conn).grouped_student_ids(assignment_id)?;
    let roster = ClassRosterRepository::new(conn).roster(class_id)?;
    Ok(roster
        .into_iter()
        .filter(|entry| !grouped.contains(&entry.student_id))
        .collect())
}
