// ==========================================
// GroupApi - 教师操作
// ==========================================
// 调用者必须是作业所属班级的任课教师
// ==========================================

use super::registry::unassigned_roster;
use super::*;

impl GroupApi {
    /// 锁定小组（FORMING -> LOCKED）
    #[instrument(skip(self))]
    pub fn lock_group(&self, group_id: &str, teacher_id: &str) -> ApiResult<Group> {
        require_id("小组ID", group_id)?;
        require_id("教师ID", teacher_id)?;
        let group = self.store.write(|tx| -> ApiResult<Group> {
            let at = Utc::now().naive_utc();
            let (group, assignment) = load_group_context(tx, group_id)?;
            ensure_owner(tx, &assignment, teacher_id)?;
            if !group.status.can_transition_to(GroupStatus::Locked) {
                return Err(ApiError::InvalidStateTransition {
                    from: group.status.to_string(),
                    to: GroupStatus::Locked.to_string(),
                });
            }
            let groups = GroupRepository::new(tx);
            groups.update_status(group_id, GroupStatus::Locked)?;
            emit_system(tx, group_id, teacher_id, "教师已锁定小组".to_string(), at)?;
            Ok(groups.get(group_id)?)
        })?;

        info!(status = %group.status, "小组已锁定");
        Ok(group)
    }

    /// 锁定作业下所有 FORMING 小组，返回锁定数量
    #[instrument(skip(self))]
    pub fn lock_all(&self, assignment_id: &str, teacher_id: &str) -> ApiResult<usize> {
        require_id("作业ID", assignment_id)?;
        require_id("教师ID", teacher_id)?;
        let locked = self.store.write(|tx| -> ApiResult<usize> {
            let at = Utc::now().naive_utc();
            let assignment = AssignmentRepository::new(tx).get(assignment_id)?;
            ensure_owner(tx, &assignment, teacher_id)?;
            let groups = GroupRepository::new(tx);
            let mut locked = 0usize;
            for group in groups.find_by_assignment(assignment_id)? {
                if group.status != GroupStatus::Forming {
                    continue;
                }
                groups.update_status(&group.group_id, GroupStatus::Locked)?;
                emit_system(tx, &group.group_id, teacher_id, "教师已锁定小组".to_string(), at)?;
                locked += 1;
            }
            Ok(locked)
        })?;

        info!(locked, "作业小组已批量锁定");
        Ok(locked)
    }

    /// 教师手动分配学生到小组
    ///
    /// 要求 FORMING 且未满；不受组队截止时间限制
    #[instrument(skip(self))]
    pub fn assign_student(
        &self,
        group_id: &str,
        teacher_id: &str,
        student_id: &str,
    ) -> ApiResult<GroupDetail> {
        require_id("小组ID", group_id)?;
        require_id("教师ID", teacher_id)?;
        require_id("学生ID", student_id)?;
        let detail = self.store.write(|tx| -> ApiResult<GroupDetail> {
            let at = Utc::now().naive_utc();
            let (group, assignment) = load_group_context(tx, group_id)?;
            ensure_owner(tx, &assignment, teacher_id)?;
            ensure_enrolled(tx, &assignment, student_id)?;

            let members = GroupMemberRepository::new(tx);
            let existing = members.find_for_student(&group.assignment_id, student_id)?;
            let count = members.count_by_group(group_id)?;
            self.rules.check_assign(
                &group,
                &assignment.config,
                student_id,
                existing.as_ref(),
                count,
            )?;

            add_member(tx, &group, student_id, MemberRole::Member, at)?;
            emit_system(
                tx,
                group_id,
                teacher_id,
                format!("{} 被教师分配到本组", student_id),
                at,
            )?;
            load_detail(tx, group, &assignment.config)
        })?;

        info!(count = detail.capacity.count, "学生已被手动分配");
        Ok(detail)
    }

    /// 自动分组
    ///
    /// 未分组学生按花名册顺序向前填充现有 FORMING 小组，至目标人数；
    /// 不足则新建小组，首个学生为组长。目标人数 = clamp(preferred 或 max_size, min, max)。
    /// 末尾新组人数可能低于 min_size，保留并在结果中列出。
    ///
    /// # 参数
    /// - assignment_id: 作业ID
    /// - teacher_id: 任课教师ID
    /// - preferred_size: 期望人数（可选）
    #[instrument(skip(self))]
    pub fn auto_assign(
        &self,
        assignment_id: &str,
        teacher_id: &str,
        preferred_size: Option<u32>,
    ) -> ApiResult<AutoAssignReport> {
        require_id("作业ID", assignment_id)?;
        require_id("教师ID", teacher_id)?;
        let settings = self.settings()?;
        let report = self.store.write(|tx| -> ApiResult<AutoAssignReport> {
            let now = Utc::now();
            let assignment = AssignmentRepository::new(tx).get(assignment_id)?;
            ensure_owner(tx, &assignment, teacher_id)?;
            self.rules.ensure_group_assignment(&assignment)?;
            let config = &assignment.config;
            let target_size = config.target_size(preferred_size);

            let groups = GroupRepository::new(tx);
            let members = GroupMemberRepository::new(tx);
            let existing = groups.find_by_assignment(assignment_id)?;
            let mut slots = Vec::with_capacity(existing.len());
            for group in &existing {
                slots.push(GroupSlot {
                    group_id: group.group_id.clone(),
                    status: group.status,
                    member_count: members.count_by_group(&group.group_id)?,
                });
            }
            let unassigned: Vec<String> =
                unassigned_roster(tx, assignment_id, &assignment.class_id)?
                    .into_iter()
                    .map(|entry| entry.student_id)
                    .collect();

            let plan = self.auto_assign_engine.plan(&slots, &unassigned, target_size);

            let at = now.naive_utc();
            let by_id: HashMap<&str, &Group> =
                existing.iter().map(|g| (g.group_id.as_str(), g)).collect();
            let mut created: Vec<Group> = Vec::with_capacity(plan.new_group_count());

            for placement in &plan.placements {
                let student_id = placement.student_id.as_str();
                match &placement.slot {
                    SlotRef::Existing(group_id) => {
                        let group = by_id.get(group_id.as_str()).copied().ok_or_else(|| {
                            ApiError::InternalError(format!("自动分组目标小组缺失: {}", group_id))
                        })?;
                        add_member(tx, group, student_id, placement.role, at)?;
                        emit_system(
                            tx,
                            &group.group_id,
                            teacher_id,
                            format!("{} 被自动分配到本组", student_id),
                            at,
                        )?;
                    }
                    SlotRef::New(idx) if *idx == created.len() => {
                        let name = format!(
                            "{} {}",
                            settings.auto_group_name_prefix,
                            existing.len() + idx + 1
                        );
                        let group = self.insert_group_with_unique_code(
                            tx,
                            assignment_id,
                            &name,
                            student_id,
                            at,
                            settings.invite_code_max_attempts,
                        )?;
                        add_member(tx, &group, student_id, MemberRole::Leader, at)?;
                        emit_system(
                            tx,
                            &group.group_id,
                            teacher_id,
                            format!("自动分组创建了小组「{}」，{} 为组长", group.name, student_id),
                            at,
                        )?;
                        created.push(group);
                    }
                    SlotRef::New(idx) => {
                        let group = created.get(*idx).ok_or_else(|| {
                            ApiError::InternalError(format!("自动分组新建小组下标越界: {}", idx))
                        })?;
                        add_member(tx, group, student_id, placement.role, at)?;
                        emit_system(
                            tx,
                            &group.group_id,
                            teacher_id,
                            format!("{} 被自动分配到本组", student_id),
                            at,
                        )?;
                    }
                }
            }

            let undersized_group_ids: Vec<String> = plan
                .undersized_new_groups(config.min_size)
                .into_iter()
                .filter_map(|idx| created.get(idx).map(|g| g.group_id.clone()))
                .collect();

            Ok(AutoAssignReport {
                assigned_count: plan.assigned_count(),
                new_group_ids: created.into_iter().map(|g| g.group_id).collect(),
                target_size,
                undersized_group_ids,
            })
        })?;

        if !report.undersized_group_ids.is_empty() {
            warn!(
                undersized = ?report.undersized_group_ids,
                "自动分组产生人数低于下限的小组"
            );
        }
        info!(
            assigned = report.assigned_count,
            new_groups = report.new_group_ids.len(),
            target_size = report.target_size,
            "自动分组完成"
        );
        Ok(report)
    }
}
